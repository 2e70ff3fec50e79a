pub mod catalog;
pub mod pricing;
pub mod synthesizer;

pub use catalog::Catalog;
pub use pricing::{
    FixedRatePricingEngine, PricingEngine, PricingPolicy, PricingResult, PricingTrace, RoundingRule,
};
pub use synthesizer::{
    AccountExecutiveRoster, AeAssignment, LineRequest, QuoteSynthesizer, SynthesizedQuote,
};
