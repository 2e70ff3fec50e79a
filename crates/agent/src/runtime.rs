use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use salesdesk_core::audit::AuditSink;
use salesdesk_core::config::ConversationConfig;
use salesdesk_core::domain::lead::LeadForm;
use salesdesk_core::domain::message::{ChatMessage, Sender};
use salesdesk_core::domain::quote::Quote;
use salesdesk_core::flows::{ConversationPhase, PhaseAction};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::conversation::{SalesConversation, SalesServices, TurnOutcome};
use crate::progress::{quote_progress_schedule, QuoteProgress};
use crate::scheduler::pause;

const EVENT_BUFFER: usize = 64;

/// Pacing of the simulated agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingProfile {
    pub typing_delay: Duration,
    pub lead_handoff_delay: Duration,
    pub quote_step_base: Duration,
    pub quote_step_interval: Duration,
    pub autoplay_tail: Duration,
    pub autoplay_quote_pause: Duration,
    pub multi_user_tick: Duration,
    pub multi_user_ticks: u32,
    /// Replay demo scripts on their recorded timestamps.
    pub scripted_pacing: bool,
}

impl TimingProfile {
    pub fn from_config(config: &ConversationConfig) -> Self {
        Self {
            typing_delay: Duration::from_millis(config.typing_delay_ms),
            lead_handoff_delay: Duration::from_millis(config.lead_handoff_delay_ms),
            quote_step_base: Duration::from_millis(config.quote_step_base_ms),
            quote_step_interval: Duration::from_millis(config.quote_step_interval_ms),
            autoplay_tail: Duration::from_millis(config.autoplay_tail_ms),
            autoplay_quote_pause: Duration::from_millis(config.autoplay_quote_pause_ms),
            multi_user_tick: Duration::from_millis(config.multi_user_tick_ms),
            multi_user_ticks: config.multi_user_ticks,
            scripted_pacing: true,
        }
    }

    /// Zero delays, same ordering. Scripted runs and tests.
    pub fn instant() -> Self {
        Self {
            typing_delay: Duration::ZERO,
            lead_handoff_delay: Duration::ZERO,
            quote_step_base: Duration::ZERO,
            quote_step_interval: Duration::ZERO,
            autoplay_tail: Duration::ZERO,
            autoplay_quote_pause: Duration::ZERO,
            multi_user_tick: Duration::from_millis(1),
            multi_user_ticks: 4,
            scripted_pacing: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    MessageAppended { message: ChatMessage },
    Typing { active: bool },
    PhaseChanged { from: ConversationPhase, to: ConversationPhase },
    LeadFormRequested,
    QuoteProgress { progress: QuoteProgress },
    QuoteReady { quote: Box<Quote> },
    Reset { conversation_id: Uuid },
}

/// Drives one [`SalesConversation`] in real time and reports what happens over a channel.
pub struct AgentRuntime {
    conversation: Mutex<SalesConversation>,
    timing: TimingProfile,
    events: mpsc::Sender<ConversationEvent>,
    cancel: StdMutex<CancellationToken>,
}

impl AgentRuntime {
    pub fn new(
        services: Arc<SalesServices>,
        audit: Arc<dyn AuditSink>,
        timing: TimingProfile,
    ) -> (Self, mpsc::Receiver<ConversationEvent>) {
        let (events, receiver) = mpsc::channel(EVENT_BUFFER);
        let runtime = Self {
            conversation: Mutex::new(SalesConversation::open(services, audit, Utc::now())),
            timing,
            events,
            cancel: StdMutex::new(CancellationToken::new()),
        };
        (runtime, receiver)
    }

    pub fn timing(&self) -> TimingProfile {
        self.timing
    }

    /// Publishes the greeting that was posted when the session opened.
    pub async fn open(&self) -> Result<()> {
        let messages = self.conversation.lock().await.transcript().messages().to_vec();
        for message in messages {
            self.emit(ConversationEvent::MessageAppended { message }).await?;
        }
        Ok(())
    }

    pub async fn send_message(&self, text: &str) -> Result<Option<TurnOutcome>> {
        let token = self.token();
        let outcome = self.conversation.lock().await.handle_user_message(text, Utc::now())?;
        let Some(outcome) = outcome else {
            return Ok(None);
        };
        self.deliver(&token, &outcome).await?;
        Ok(Some(outcome))
    }

    pub async fn submit_lead(&self, form: &LeadForm) -> Result<TurnOutcome> {
        let token = self.token();
        let outcome = self.conversation.lock().await.submit_lead(form, Utc::now())?;
        self.deliver(&token, &outcome).await?;
        Ok(outcome)
    }

    pub async fn approve_products(&self) -> Result<TurnOutcome> {
        let token = self.token();
        let outcome = self.conversation.lock().await.approve_products(Utc::now())?;
        self.deliver(&token, &outcome).await?;
        Ok(outcome)
    }

    /// Cancels every pending step and starts a new chat.
    pub async fn reset(&self) -> Result<()> {
        {
            let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
            cancel.cancel();
            *cancel = CancellationToken::new();
        }
        let (conversation_id, greeting) = {
            let mut conversation = self.conversation.lock().await;
            conversation.reset(Utc::now());
            (conversation.id(), conversation.transcript().messages().to_vec())
        };
        self.emit(ConversationEvent::Reset { conversation_id }).await?;
        for message in greeting {
            self.emit(ConversationEvent::MessageAppended { message }).await?;
        }
        Ok(())
    }

    pub async fn phase(&self) -> ConversationPhase {
        self.conversation.lock().await.phase()
    }

    pub async fn quote(&self) -> Option<Quote> {
        self.conversation.lock().await.quote().cloned()
    }

    pub async fn mark_quote_viewed(&self) -> bool {
        self.conversation.lock().await.mark_quote_viewed()
    }

    pub async fn with_conversation<T>(&self, read: impl FnOnce(&SalesConversation) -> T) -> T {
        read(&*self.conversation.lock().await)
    }

    fn token(&self) -> CancellationToken {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn emit(&self, event: ConversationEvent) -> Result<()> {
        self.events.send(event).await.map_err(|_| anyhow!("conversation event receiver dropped"))
    }

    async fn deliver(&self, token: &CancellationToken, outcome: &TurnOutcome) -> Result<()> {
        let (user, agent): (Vec<&ChatMessage>, Vec<&ChatMessage>) =
            outcome.messages.iter().partition(|message| message.sender == Sender::User);
        for message in user {
            self.emit(ConversationEvent::MessageAppended { message: message.clone() }).await?;
        }

        if !agent.is_empty() {
            self.emit(ConversationEvent::Typing { active: true }).await?;
            if !pause(token, self.timing.typing_delay).await {
                return Ok(());
            }
            self.emit(ConversationEvent::Typing { active: false }).await?;
            for message in agent {
                self.emit(ConversationEvent::MessageAppended { message: message.clone() }).await?;
            }
        }

        if outcome.advanced() {
            self.emit(ConversationEvent::PhaseChanged { from: outcome.from, to: outcome.phase }).await?;
        }

        if outcome.has_action(PhaseAction::PromptLeadCapture) {
            if !pause(token, self.timing.lead_handoff_delay).await {
                return Ok(());
            }
            self.emit(ConversationEvent::LeadFormRequested).await?;
        }

        if outcome.has_action(PhaseAction::ScheduleQuoteSynthesis) {
            self.run_quotation(token).await?;
        }
        Ok(())
    }

    async fn run_quotation(&self, token: &CancellationToken) -> Result<()> {
        let schedule =
            quote_progress_schedule(self.timing.quote_step_base, self.timing.quote_step_interval);
        let outcome = schedule
            .run(token, |progress| async move {
                if self.emit(ConversationEvent::QuoteProgress { progress }).await.is_err() {
                    tracing::warn!(
                        event_name = "conversation.event_dropped",
                        step = progress.step,
                        "quote progress event dropped"
                    );
                }
            })
            .await;
        if outcome.is_cancelled() {
            tracing::info!(
                event_name = "quote.generation_cancelled",
                steps_fired = outcome.fired(),
                "quote generation cancelled"
            );
            return Ok(());
        }

        let (turn, quote) = {
            let mut conversation = self.conversation.lock().await;
            let turn = conversation.complete_quotation(Utc::now())?;
            let quote = conversation
                .quote()
                .cloned()
                .ok_or_else(|| anyhow!("quotation completed without a quote"))?;
            (turn, quote)
        };
        for message in turn.messages {
            self.emit(ConversationEvent::MessageAppended { message }).await?;
        }
        self.emit(ConversationEvent::PhaseChanged { from: turn.from, to: turn.phase }).await?;
        self.emit(ConversationEvent::QuoteReady { quote: Box::new(quote) }).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use salesdesk_core::audit::InMemoryAuditSink;
    use salesdesk_core::config::AppConfig;
    use salesdesk_core::domain::lead::LeadForm;
    use salesdesk_core::flows::ConversationPhase;
    use tokio::sync::mpsc;

    use super::{AgentRuntime, ConversationEvent, TimingProfile};
    use crate::conversation::SalesServices;

    fn runtime(timing: TimingProfile) -> (AgentRuntime, mpsc::Receiver<ConversationEvent>) {
        let services = Arc::new(SalesServices::builtin().expect("services"));
        AgentRuntime::new(services, Arc::new(InMemoryAuditSink::default()), timing)
    }

    fn drain(receiver: &mut mpsc::Receiver<ConversationEvent>) -> Vec<ConversationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn default_profile_matches_configured_pacing() {
        let timing = TimingProfile::from_config(&AppConfig::default().conversation);
        assert_eq!(timing.typing_delay, Duration::from_millis(1_000));
        assert_eq!(timing.quote_step_interval, Duration::from_millis(800));
        assert_eq!(timing.multi_user_ticks, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn first_message_requests_the_lead_form_after_the_reply() {
        let (runtime, mut receiver) = runtime(TimingProfile::from_config(&AppConfig::default().conversation));
        runtime.send_message("Hello").await.expect("turn");

        let events = drain(&mut receiver);
        assert!(matches!(events.first(), Some(ConversationEvent::MessageAppended { .. })));
        assert!(events.contains(&ConversationEvent::Typing { active: true }));
        assert_eq!(events.last(), Some(&ConversationEvent::LeadFormRequested));
        assert!(events.contains(&ConversationEvent::PhaseChanged {
            from: ConversationPhase::Greeting,
            to: ConversationPhase::LeadCapture,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn approval_runs_seven_progress_steps_then_delivers_the_quote() {
        let (runtime, mut receiver) = runtime(TimingProfile::instant());
        runtime.send_message("Hello").await.expect("greeting");
        runtime
            .submit_lead(&LeadForm::new("Jane Doe", "Acme", "jane@acme.io"))
            .await
            .expect("lead");
        runtime.send_message("We need database servers").await.expect("requirements");
        drain(&mut receiver);

        runtime.send_message("Yes, proceed").await.expect("approval");
        let events = drain(&mut receiver);

        let steps = events
            .iter()
            .filter(|event| matches!(event, ConversationEvent::QuoteProgress { .. }))
            .count();
        assert_eq!(steps, 7);
        assert!(matches!(events.last(), Some(ConversationEvent::QuoteReady { .. })));
        assert_eq!(runtime.phase().await, ConversationPhase::Completed);
        assert!(runtime.quote().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_during_quote_generation_cancels_the_remaining_steps() {
        let (runtime, mut receiver) =
            runtime(TimingProfile::from_config(&AppConfig::default().conversation));
        let runtime = Arc::new(runtime);
        runtime.send_message("Hello").await.expect("greeting");
        runtime
            .submit_lead(&LeadForm::new("Jane Doe", "Acme", "jane@acme.io"))
            .await
            .expect("lead");
        runtime.send_message("small office server").await.expect("requirements");
        drain(&mut receiver);

        let approving = {
            let runtime = Arc::clone(&runtime);
            tokio::spawn(async move { runtime.approve_products().await })
        };
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        runtime.reset().await.expect("reset");
        approving.await.expect("join").expect("approval");

        let events = drain(&mut receiver);
        assert!(events.iter().any(|event| matches!(event, ConversationEvent::Reset { .. })));
        assert!(!events.iter().any(|event| matches!(event, ConversationEvent::QuoteReady { .. })));
        let steps = events
            .iter()
            .filter(|event| matches!(event, ConversationEvent::QuoteProgress { .. }))
            .count();
        assert!(steps < 7);
        assert_eq!(runtime.phase().await, ConversationPhase::Greeting);
        assert!(runtime.quote().await.is_none());
    }
}
