//! Keyword-driven recommendation: catalog selection, requirement extraction,
//! message intent and side-panel topics. Every lookup is an ordered table so the
//! first-match-wins behaviour stays explicit.

pub mod analyzer;
pub mod intent;
pub mod selector;
pub mod topics;

pub use analyzer::RequirementsAnalyzer;
pub use intent::{IntentPriority, MessageIntent};
pub use selector::{KeywordRule, Recommendation, RecommendationSelector, KEYWORD_RULES};
pub use topics::related_topics;
