//! Scripted demo playback.
//!
//! Each [`DemoConversation`] is replayed on its recorded timestamps. The last
//! line holds for the tail delay, then after a further pause the scenario quote
//! is synthesized from the demo's template and always assigned to the first
//! account executive.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use salesdesk_core::cpq::synthesizer::{AeAssignment, LineRequest, SynthesizedQuote};
use salesdesk_core::domain::customer::CustomerInfo;
use salesdesk_core::domain::demo::{DemoConversation, ScriptedKind};
use salesdesk_core::domain::message::Sender;
use salesdesk_core::domain::product::ServerProduct;
use salesdesk_core::domain::quote::Quote;
use salesdesk_core::errors::DomainError;
use salesdesk_core::recommend::related_topics;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::conversation::SalesServices;
use crate::runtime::TimingProfile;
use crate::scheduler::{Schedule, ScheduleOutcome};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutoplayEvent {
    Started { demo_id: String, title: String },
    Message {
        demo_id: String,
        index: usize,
        sender: Sender,
        kind: ScriptedKind,
        content: String,
        activity: Option<&'static str>,
        related_topics: Vec<&'static str>,
        products: Vec<ServerProduct>,
    },
    QuoteReady { demo_id: String, quote: Box<Quote> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AutoplayStep {
    Show(usize),
    DeliverQuote,
}

pub struct AutoplayDemo {
    demos: Vec<DemoConversation>,
    current: AtomicUsize,
    services: Arc<SalesServices>,
    timing: TimingProfile,
    cancel: Mutex<CancellationToken>,
}

impl AutoplayDemo {
    pub fn new(
        demos: Vec<DemoConversation>,
        services: Arc<SalesServices>,
        timing: TimingProfile,
    ) -> Result<Self, DomainError> {
        if demos.is_empty() {
            return Err(DomainError::InvariantViolation("autoplay needs at least one demo".to_string()));
        }
        Ok(Self {
            demos,
            current: AtomicUsize::new(0),
            services,
            timing,
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    pub fn demos(&self) -> &[DemoConversation] {
        &self.demos
    }

    pub fn current(&self) -> &DemoConversation {
        &self.demos[self.current.load(Ordering::SeqCst) % self.demos.len()]
    }

    pub fn select(&self, demo_id: &str) -> bool {
        match self.demos.iter().position(|demo| demo.id == demo_id) {
            Some(index) => {
                self.reset();
                self.current.store(index, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Stops playback; the next `play` starts from the first line.
    pub fn reset(&self) {
        let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        cancel.cancel();
        *cancel = CancellationToken::new();
    }

    /// Cycles to the following demo (wrapping) and rewinds.
    pub fn next_demo(&self) -> &DemoConversation {
        let next = (self.current.load(Ordering::SeqCst) + 1) % self.demos.len();
        self.reset();
        self.current.store(next, Ordering::SeqCst);
        self.current()
    }

    /// Every scripted line at its timestamp, then the quote after the tail and pause.
    fn schedule(&self, demo: &DemoConversation) -> Schedule<AutoplayStep> {
        if !self.timing.scripted_pacing {
            return (0..demo.conversation.len())
                .fold(Schedule::new(), |schedule, index| schedule.at(Duration::ZERO, AutoplayStep::Show(index)))
                .at(Duration::ZERO, AutoplayStep::DeliverQuote);
        }
        let last_at = demo.conversation.last().map(|message| message.timestamp_ms).unwrap_or(0);
        let quote_at =
            Duration::from_millis(last_at) + self.timing.autoplay_tail + self.timing.autoplay_quote_pause;
        demo.conversation
            .iter()
            .enumerate()
            .fold(Schedule::new(), |schedule, (index, message)| {
                schedule.at(Duration::from_millis(message.timestamp_ms), AutoplayStep::Show(index))
            })
            .at(quote_at, AutoplayStep::DeliverQuote)
    }

    /// Plays the current demo to completion or until [`Self::reset`] is called.
    pub async fn play(&self, events: &mpsc::Sender<AutoplayEvent>) -> Result<ScheduleOutcome> {
        let token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let demo = self.current();
        let schedule = self.schedule(demo);

        tracing::info!(
            event_name = "autoplay.started",
            demo_id = %demo.id,
            message_count = demo.conversation.len(),
            "autoplay demo started"
        );
        send(events, AutoplayEvent::Started { demo_id: demo.id.clone(), title: demo.title.clone() }).await?;

        let mut failure = None;
        let outcome = schedule
            .run(&token, |step| {
                let event = match step {
                    AutoplayStep::Show(index) => Ok(self.message_event(demo, index)),
                    AutoplayStep::DeliverQuote => self
                        .build_quote(demo, Utc::now())
                        .map(|synthesized| AutoplayEvent::QuoteReady {
                            demo_id: demo.id.clone(),
                            quote: Box::new(synthesized.quote),
                        })
                        .map_err(anyhow::Error::from),
                };
                let failed = failure.is_some();
                let pending = match event {
                    Ok(event) if !failed => Some(event),
                    Ok(_) => None,
                    Err(error) => {
                        failure.get_or_insert(error);
                        None
                    }
                };
                async move {
                    if let Some(event) = pending {
                        if events.send(event).await.is_err() {
                            tracing::warn!(event_name = "autoplay.event_dropped", "autoplay receiver dropped");
                        }
                    }
                }
            })
            .await;

        if let Some(error) = failure {
            return Err(error);
        }
        tracing::info!(
            event_name = "autoplay.finished",
            demo_id = %demo.id,
            cancelled = outcome.is_cancelled(),
            steps_fired = outcome.fired(),
            "autoplay demo finished"
        );
        Ok(outcome)
    }

    /// Quote for a scripted scenario, built from its template with literal overrides.
    pub fn build_quote(&self, demo: &DemoConversation, now: DateTime<Utc>) -> Result<SynthesizedQuote, DomainError> {
        let template = &demo.quote_template;
        let product = self
            .services
            .catalog
            .find(&template.product_id)
            .cloned()
            .ok_or_else(|| DomainError::UnknownProduct(template.product_id.clone()))?;
        let request = LineRequest::new(product)
            .with_quantity(template.quantity)
            .with_unit_price(template.unit_price)
            .with_description(template.description.clone())
            .with_configuration(template.configuration.clone());
        let customer = CustomerInfo {
            name: demo.persona.name.clone(),
            company: demo.persona.company.clone(),
            email: demo.persona.email.clone(),
            phone: None,
        };

        self.services.synthesizer.synthesize_assigned(&customer, vec![request], now, AeAssignment::First)
    }

    fn message_event(&self, demo: &DemoConversation, index: usize) -> AutoplayEvent {
        let message = &demo.conversation[index];
        let is_agent = message.sender == Sender::Agent;
        let products = message
            .products
            .iter()
            .filter_map(|id| self.services.catalog.find(id).cloned())
            .collect();

        AutoplayEvent::Message {
            demo_id: demo.id.clone(),
            index,
            sender: message.sender,
            kind: message.kind,
            content: message.content.clone(),
            activity: is_agent.then(|| message.kind.activity_label()),
            related_topics: if is_agent { related_topics(&message.content) } else { Vec::new() },
            products,
        }
    }
}

async fn send(events: &mpsc::Sender<AutoplayEvent>, event: AutoplayEvent) -> Result<()> {
    events.send(event).await.map_err(|_| anyhow!("autoplay event receiver dropped"))
}
