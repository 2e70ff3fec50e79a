pub mod account_executive;
pub mod customer;
pub mod demo;
pub mod lead;
pub mod message;
pub mod product;
pub mod quote;
