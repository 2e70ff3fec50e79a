use serde::{Deserialize, Serialize};

const ESCALATION_KEYWORDS: &[&str] = &["help", "support", "speak to someone", "technical"];
const APPROVAL_KEYWORDS: &[&str] = &["yes", "approve", "quote", "proceed", "generate"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageIntent {
    General,
    Approval,
    Escalation,
}

/// Which intent wins when a message carries both signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentPriority {
    ApprovalFirst,
    EscalationFirst,
}

impl MessageIntent {
    pub fn classify(text: &str, priority: IntentPriority) -> Self {
        let lowered = text.to_lowercase();
        let approval = APPROVAL_KEYWORDS.iter().any(|keyword| lowered.contains(keyword));
        let escalation = ESCALATION_KEYWORDS.iter().any(|keyword| lowered.contains(keyword));

        match (priority, approval, escalation) {
            (IntentPriority::ApprovalFirst, true, _) => Self::Approval,
            (IntentPriority::EscalationFirst, _, true) => Self::Escalation,
            (_, true, false) => Self::Approval,
            (_, false, true) => Self::Escalation,
            _ => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Approval => "approval",
            Self::Escalation => "escalation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IntentPriority, MessageIntent};

    #[test]
    fn priority_decides_mixed_messages() {
        let mixed = "Yes please, but I also need technical help";
        assert_eq!(MessageIntent::classify(mixed, IntentPriority::ApprovalFirst), MessageIntent::Approval);
        assert_eq!(
            MessageIntent::classify(mixed, IntentPriority::EscalationFirst),
            MessageIntent::Escalation
        );
    }

    #[test]
    fn single_signal_messages_classify_regardless_of_priority() {
        for priority in [IntentPriority::ApprovalFirst, IntentPriority::EscalationFirst] {
            assert_eq!(
                MessageIntent::classify("Please generate the quote", priority),
                MessageIntent::Approval
            );
            assert_eq!(
                MessageIntent::classify("Can I speak to someone?", priority),
                MessageIntent::Escalation
            );
            assert_eq!(MessageIntent::classify("What about power draw?", priority), MessageIntent::General);
        }
    }
}
