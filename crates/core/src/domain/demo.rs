use serde::{Deserialize, Serialize};

use crate::domain::message::Sender;
use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoPersona {
    pub name: String,
    pub company: String,
    pub email: String,
    pub role: String,
}

/// Stage label carried by scripted demo lines; drives the activity panel text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedKind {
    Text,
    Greeting,
    Qualification,
    Recommendation,
    QuoteGeneration,
    Completion,
    Escalation,
}

impl ScriptedKind {
    pub fn activity_label(&self) -> &'static str {
        match self {
            Self::Greeting => "Initializing conversation...",
            Self::Qualification => "Analyzing requirements...",
            Self::Recommendation => "Matching server configurations...",
            Self::QuoteGeneration => "Generating enterprise quotation...",
            Self::Completion => "Finalizing quote delivery...",
            Self::Escalation => "Connecting sales support...",
            Self::Text => "Processing response...",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedMessage {
    pub timestamp_ms: u64,
    pub sender: Sender,
    pub kind: ScriptedKind,
    pub content: String,
    #[serde(default)]
    pub products: Vec<ProductId>,
}

/// Literal per-scenario overrides used when the demo ends in a quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoQuoteTemplate {
    pub product_id: ProductId,
    pub unit_price: i64,
    pub quantity: u32,
    pub description: String,
    #[serde(default)]
    pub configuration: ConfigurationOverrides,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationOverrides {
    pub processor: Option<String>,
    pub memory: Option<String>,
    pub storage: Option<String>,
    pub network: Option<String>,
    pub warranty: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConversation {
    pub id: String,
    pub title: String,
    pub persona: DemoPersona,
    pub scenario: String,
    pub conversation: Vec<ScriptedMessage>,
    pub quote_template: DemoQuoteTemplate,
}

impl DemoConversation {
    /// Gap before the message after `index`; the final message holds for `tail_ms`.
    pub fn delay_after(&self, index: usize, tail_ms: u64) -> u64 {
        match (self.conversation.get(index), self.conversation.get(index + 1)) {
            (Some(current), Some(next)) => next.timestamp_ms.saturating_sub(current.timestamp_ms),
            _ => tail_ms,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedLine {
    pub sender: Sender,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiUserProfile {
    pub name: String,
    pub company: String,
    pub location: String,
    pub scenario: String,
    pub flow: Vec<ScriptedLine>,
}
