pub mod engine;
pub mod states;

pub use engine::{ConversationFlow, FlowDefinition, FlowEngine, FlowTransitionError};
pub use states::{ConversationPhase, FlowContext, PhaseAction, PhaseEvent, TransitionOutcome};
