//! Conversation runtime for the simulated sales advisor.
//!
//! `conversation` owns one chat session and routes every event through the
//! core phase controller. `runtime` paces that session in real time (typing
//! delay, lead-form hand-off, staged quote progress) and streams
//! [`runtime::ConversationEvent`]s over a channel. `autoplay` and `multi_user`
//! replay the scripted demos.
//!
//! All timed work goes through `scheduler`: one loop per session, checked
//! against a cancellation token before each step, so a reset never lets a
//! stale step fire.

pub mod autoplay;
pub mod conversation;
pub mod multi_user;
pub mod progress;
pub mod responses;
pub mod runtime;
pub mod scheduler;

pub use autoplay::{AutoplayDemo, AutoplayEvent};
pub use conversation::{SalesConversation, SalesServices, TurnOutcome};
pub use multi_user::{MultiUserDemo, MultiUserTick, MultiUserTotals, SessionStatus};
pub use runtime::{AgentRuntime, ConversationEvent, TimingProfile};
pub use scheduler::{Schedule, ScheduleOutcome};
