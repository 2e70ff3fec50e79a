use std::fmt;

use serde::{Deserialize, Serialize};

use crate::recommend::intent::{IntentPriority, MessageIntent};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    Greeting,
    LeadCapture,
    Requirements,
    Recommendation,
    Quotation,
    Completed,
}

impl ConversationPhase {
    pub const ALL: [Self; 6] = [
        Self::Greeting,
        Self::LeadCapture,
        Self::Requirements,
        Self::Recommendation,
        Self::Quotation,
        Self::Completed,
    ];

    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Greeting => 0,
            Self::LeadCapture => 1,
            Self::Requirements => 2,
            Self::Recommendation => 3,
            Self::Quotation => 4,
            Self::Completed => 5,
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(usize::from(self.ordinal()) + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::LeadCapture => "lead_capture",
            Self::Requirements => "requirements",
            Self::Recommendation => "recommendation",
            Self::Quotation => "quotation",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "intent", rename_all = "snake_case")]
pub enum PhaseEvent {
    UserMessage(MessageIntent),
    LeadSubmitted,
    ProductsApproved,
    QuoteReady,
}

impl PhaseEvent {
    /// Classifies free text for the phase it arrives in. Approval outranks
    /// escalation only while recommendations are on screen.
    pub fn user_message(phase: ConversationPhase, text: &str) -> Self {
        let priority = match phase {
            ConversationPhase::Recommendation => IntentPriority::ApprovalFirst,
            _ => IntentPriority::EscalationFirst,
        };
        Self::UserMessage(MessageIntent::classify(text, priority))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UserMessage(_) => "user_message",
            Self::LeadSubmitted => "lead_submitted",
            Self::ProductsApproved => "products_approved",
            Self::QuoteReady => "quote_ready",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub missing_required_fields: Vec<String>,
}

impl FlowContext {
    pub fn missing(fields: Vec<String>) -> Self {
        Self { missing_required_fields: fields }
    }
}

/// Side effects the caller owes after a transition. The engine itself is pure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseAction {
    PromptLeadCapture,
    RepromptLeadCapture,
    AcknowledgeLead,
    SelectRecommendations,
    AnswerFollowUp,
    AcknowledgeApproval,
    ScheduleQuoteSynthesis,
    ReportQuoteProgress,
    DeliverQuote,
    EscalateToSupport,
    AnnounceCompleted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: ConversationPhase,
    pub to: ConversationPhase,
    pub event: PhaseEvent,
    pub actions: Vec<PhaseAction>,
}

impl TransitionOutcome {
    pub fn advanced(&self) -> bool {
        self.from != self.to
    }
}
