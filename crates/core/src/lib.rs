pub mod audit;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod flows;
pub mod recommend;

pub use cpq::{
    AccountExecutiveRoster, AeAssignment, Catalog, FixedRatePricingEngine, LineRequest,
    PricingEngine, PricingPolicy, QuoteSynthesizer, RoundingRule, SynthesizedQuote,
};
pub use domain::account_executive::{AccountExecutive, AccountExecutiveId};
pub use domain::customer::{CustomerInfo, CustomerRequirements};
pub use domain::demo::{DemoConversation, MultiUserProfile};
pub use domain::lead::{LeadField, LeadForm, LeadValidationErrors};
pub use domain::message::{ChatMessage, MessageAttachment, MessageKind, Sender, Transcript};
pub use domain::product::{ProductId, ServerProduct, UseCase};
pub use domain::quote::{PricingBreakdown, Quote, QuoteId, QuoteLine};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use fixtures::{FixtureError, FixturePaths, FixtureSet};
pub use flows::{ConversationPhase, FlowEngine, PhaseAction, PhaseEvent};
pub use recommend::{MessageIntent, Recommendation, RecommendationSelector, RequirementsAnalyzer};
