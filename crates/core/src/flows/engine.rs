use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::flows::states::{
    ConversationPhase, FlowContext, PhaseAction, PhaseEvent, TransitionOutcome,
};
use crate::recommend::intent::MessageIntent;

pub trait FlowDefinition {
    fn initial_phase(&self) -> ConversationPhase;
    fn transition(
        &self,
        current: ConversationPhase,
        event: PhaseEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// The single linear sales conversation. Follow-up questions stay in place; there
/// are no back-paths.
#[derive(Clone, Debug, Default)]
pub struct ConversationFlow;

impl FlowDefinition for ConversationFlow {
    fn initial_phase(&self) -> ConversationPhase {
        ConversationPhase::Greeting
    }

    fn transition(
        &self,
        current: ConversationPhase,
        event: PhaseEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_conversation(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_phase(&self) -> ConversationPhase {
        self.flow.initial_phase()
    }

    /// Applies one event and enforces that the phase never regresses nor skips
    /// ahead, whatever the flow definition returned.
    pub fn apply(
        &self,
        current: ConversationPhase,
        event: PhaseEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        let outcome = self.flow.transition(current, event, context)?;
        let (from, to) = (outcome.from.ordinal(), outcome.to.ordinal());
        if to < from || to > from + 1 {
            return Err(FlowTransitionError::NonLinearTransition {
                from: outcome.from,
                to: outcome.to,
            });
        }
        Ok(outcome)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: ConversationPhase,
        event: PhaseEvent,
        context: &FlowContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    audit
                        .event(
                            "conversation.transition_applied",
                            AuditCategory::Conversation,
                            AuditOutcome::Success,
                        )
                        .with_metadata("from", outcome.from.as_str())
                        .with_metadata("to", outcome.to.as_str())
                        .with_metadata("event", outcome.event.name()),
                );
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "conversation.transition_rejected",
                    correlation_id = %audit.correlation_id,
                    conversation_id = %audit.conversation_id,
                    phase = %current,
                    error = %error,
                    "phase transition rejected"
                );
                sink.emit(
                    audit
                        .event(
                            "conversation.transition_rejected",
                            AuditCategory::Conversation,
                            AuditOutcome::Rejected,
                        )
                        .with_metadata("from", current.as_str())
                        .with_metadata("event", event.name())
                        .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<ConversationFlow> {
    fn default() -> Self {
        Self::new(ConversationFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("missing required fields before leaving {phase}: {missing_fields:?}")]
    MissingRequiredFields { phase: ConversationPhase, missing_fields: Vec<String> },
    #[error("invalid transition from {phase} using event {event:?}")]
    InvalidTransition { phase: ConversationPhase, event: PhaseEvent },
    #[error("transition from {from} to {to} is not a single forward step")]
    NonLinearTransition { from: ConversationPhase, to: ConversationPhase },
}

fn transition_conversation(
    current: ConversationPhase,
    event: PhaseEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use ConversationPhase::{Completed, Greeting, LeadCapture, Quotation, Recommendation, Requirements};
    use MessageIntent::{Approval, Escalation};
    use PhaseAction::{
        AcknowledgeApproval, AcknowledgeLead, AnnounceCompleted, AnswerFollowUp, DeliverQuote,
        EscalateToSupport, PromptLeadCapture, ReportQuoteProgress, RepromptLeadCapture,
        ScheduleQuoteSynthesis, SelectRecommendations,
    };
    use PhaseEvent::{LeadSubmitted, ProductsApproved, QuoteReady, UserMessage};

    let (to, actions) = match (current, event) {
        (Greeting, UserMessage(_)) => (LeadCapture, vec![PromptLeadCapture]),
        (LeadCapture, UserMessage(_)) => (LeadCapture, vec![RepromptLeadCapture]),
        (LeadCapture, LeadSubmitted) => {
            if !context.missing_required_fields.is_empty() {
                return Err(FlowTransitionError::MissingRequiredFields {
                    phase: current,
                    missing_fields: context.missing_required_fields.clone(),
                });
            }
            (Requirements, vec![AcknowledgeLead])
        }
        (Requirements, UserMessage(_)) => (Recommendation, vec![SelectRecommendations]),
        (Recommendation, UserMessage(Approval)) | (Recommendation, ProductsApproved) => {
            (Quotation, vec![AcknowledgeApproval, ScheduleQuoteSynthesis])
        }
        (Recommendation, UserMessage(Escalation)) | (Quotation, UserMessage(Escalation)) => {
            (current, vec![EscalateToSupport])
        }
        (Recommendation, UserMessage(_)) => (Recommendation, vec![AnswerFollowUp]),
        (Quotation, UserMessage(_)) => (Quotation, vec![ReportQuoteProgress]),
        (Quotation, QuoteReady) => (Completed, vec![DeliverQuote]),
        (Completed, UserMessage(_)) => (Completed, vec![AnnounceCompleted]),
        _ => return Err(FlowTransitionError::InvalidTransition { phase: current, event }),
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditContext, InMemoryAuditSink};
    use crate::flows::engine::{
        ConversationFlow, FlowDefinition, FlowEngine, FlowTransitionError,
    };
    use crate::flows::states::{
        ConversationPhase, FlowContext, PhaseAction, PhaseEvent, TransitionOutcome,
    };
    use crate::recommend::intent::MessageIntent;

    const GENERAL: PhaseEvent = PhaseEvent::UserMessage(MessageIntent::General);

    #[test]
    fn happy_path_walks_every_phase_in_order() {
        let engine = FlowEngine::default();
        let context = FlowContext::default();
        let mut phase = engine.initial_phase();

        let events = [
            GENERAL,
            PhaseEvent::LeadSubmitted,
            PhaseEvent::user_message(
                ConversationPhase::Requirements,
                "We need servers for virtualization with 50 VMs",
            ),
            PhaseEvent::user_message(ConversationPhase::Recommendation, "Yes, generate the quote"),
            PhaseEvent::QuoteReady,
        ];
        let mut visited = vec![phase];
        for event in events {
            phase = engine.apply(phase, event, &context).expect("happy path").to;
            visited.push(phase);
        }

        assert_eq!(visited, ConversationPhase::ALL.to_vec());
    }

    #[test]
    fn requirements_always_advance_even_for_vague_input() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(
                ConversationPhase::Requirements,
                PhaseEvent::user_message(
                    ConversationPhase::Requirements,
                    "I don't know, just something general, help",
                ),
                &FlowContext::default(),
            )
            .expect("requirements -> recommendation");

        assert_eq!(outcome.to, ConversationPhase::Recommendation);
        assert_eq!(outcome.actions, vec![PhaseAction::SelectRecommendations]);
    }

    #[test]
    fn lead_submission_with_missing_fields_does_not_transition() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(
                ConversationPhase::LeadCapture,
                PhaseEvent::LeadSubmitted,
                &FlowContext::missing(vec!["email".to_owned()]),
            )
            .expect_err("missing email");

        assert!(matches!(
            error,
            FlowTransitionError::MissingRequiredFields { phase: ConversationPhase::LeadCapture, .. }
        ));
    }

    #[test]
    fn follow_ups_and_escalations_stay_in_phase() {
        let engine = FlowEngine::default();
        let context = FlowContext::default();

        let follow_up = engine
            .apply(ConversationPhase::Recommendation, GENERAL, &context)
            .expect("follow up");
        assert!(!follow_up.advanced());
        assert_eq!(follow_up.actions, vec![PhaseAction::AnswerFollowUp]);

        let escalation = engine
            .apply(
                ConversationPhase::Recommendation,
                PhaseEvent::user_message(ConversationPhase::Recommendation, "Can I speak to someone?"),
                &context,
            )
            .expect("escalation");
        assert_eq!(escalation.to, ConversationPhase::Recommendation);
        assert_eq!(escalation.actions, vec![PhaseAction::EscalateToSupport]);

        let completed = engine
            .apply(ConversationPhase::Completed, GENERAL, &context)
            .expect("completed stays");
        assert_eq!(completed.actions, vec![PhaseAction::AnnounceCompleted]);
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let engine = FlowEngine::default();
        let context = FlowContext::default();
        let cases = [
            (ConversationPhase::Greeting, PhaseEvent::QuoteReady),
            (ConversationPhase::Greeting, PhaseEvent::LeadSubmitted),
            (ConversationPhase::Requirements, PhaseEvent::ProductsApproved),
            (ConversationPhase::Completed, PhaseEvent::QuoteReady),
            (ConversationPhase::Quotation, PhaseEvent::LeadSubmitted),
        ];

        for (phase, event) in cases {
            let error = engine.apply(phase, event, &context).expect_err("out of order");
            assert_eq!(error, FlowTransitionError::InvalidTransition { phase, event });
        }
    }

    #[test]
    fn no_event_ever_regresses_or_skips() {
        let engine = FlowEngine::default();
        let events = [
            GENERAL,
            PhaseEvent::UserMessage(MessageIntent::Approval),
            PhaseEvent::UserMessage(MessageIntent::Escalation),
            PhaseEvent::LeadSubmitted,
            PhaseEvent::ProductsApproved,
            PhaseEvent::QuoteReady,
        ];

        for phase in ConversationPhase::ALL {
            for event in events {
                if let Ok(outcome) = engine.apply(phase, event, &FlowContext::default()) {
                    assert!(outcome.to.ordinal() >= phase.ordinal());
                    assert!(outcome.to.ordinal() <= phase.ordinal() + 1);
                }
            }
        }
    }

    #[test]
    fn misbehaving_flow_definition_is_caught_by_engine() {
        struct SkippingFlow;

        impl FlowDefinition for SkippingFlow {
            fn initial_phase(&self) -> ConversationPhase {
                ConversationPhase::Greeting
            }

            fn transition(
                &self,
                current: ConversationPhase,
                event: PhaseEvent,
                _context: &FlowContext,
            ) -> Result<TransitionOutcome, FlowTransitionError> {
                Ok(TransitionOutcome {
                    from: current,
                    to: ConversationPhase::Completed,
                    event,
                    actions: Vec::new(),
                })
            }
        }

        let error = FlowEngine::new(SkippingFlow)
            .apply(ConversationPhase::Greeting, GENERAL, &FlowContext::default())
            .expect_err("skip detected");
        assert!(matches!(error, FlowTransitionError::NonLinearTransition { .. }));
        assert_eq!(ConversationFlow.initial_phase(), ConversationPhase::Greeting);
    }

    #[test]
    fn transitions_emit_audit_events() {
        let engine = FlowEngine::default();
        let sink = InMemoryAuditSink::default();
        let audit = AuditContext::new("conv-1", "req-42", "phase-engine");

        engine
            .apply_with_audit(ConversationPhase::Greeting, GENERAL, &FlowContext::default(), &sink, &audit)
            .expect("greeting -> lead capture");
        let _ = engine.apply_with_audit(
            ConversationPhase::Greeting,
            PhaseEvent::QuoteReady,
            &FlowContext::default(),
            &sink,
            &audit,
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "conversation.transition_applied");
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("lead_capture"));
        assert_eq!(events[1].event_type, "conversation.transition_rejected");
        assert_eq!(events[1].correlation_id, "req-42");
    }
}
