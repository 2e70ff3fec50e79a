use std::sync::Arc;

use chrono::{DateTime, Utc};
use salesdesk_core::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use salesdesk_core::config::AppConfig;
use salesdesk_core::cpq::catalog::Catalog;
use salesdesk_core::cpq::pricing::{FixedRatePricingEngine, PricingTrace};
use salesdesk_core::cpq::synthesizer::{AccountExecutiveRoster, QuoteSynthesizer};
use salesdesk_core::domain::customer::{CustomerInfo, CustomerRequirements};
use salesdesk_core::domain::lead::LeadForm;
use salesdesk_core::domain::message::{ChatMessage, MessageAttachment, MessageKind, Transcript};
use salesdesk_core::domain::product::ServerProduct;
use salesdesk_core::domain::quote::Quote;
use salesdesk_core::errors::{ApplicationError, DomainError};
use salesdesk_core::fixtures::FixtureSet;
use salesdesk_core::flows::{
    ConversationFlow, ConversationPhase, FlowContext, FlowEngine, FlowTransitionError,
    PhaseAction, PhaseEvent, TransitionOutcome,
};
use salesdesk_core::recommend::{RecommendationSelector, RequirementsAnalyzer};
use uuid::Uuid;

use crate::responses;

const CUSTOMER_ACTOR: &str = "customer";

/// Stateless collaborators shared by every session.
pub struct SalesServices {
    pub catalog: Catalog,
    pub selector: RecommendationSelector,
    pub analyzer: RequirementsAnalyzer,
    pub synthesizer: QuoteSynthesizer,
    pub engine: FlowEngine<ConversationFlow>,
}

impl SalesServices {
    pub fn new(fixtures: &FixtureSet, config: &AppConfig) -> Result<Self, ApplicationError> {
        let roster = AccountExecutiveRoster::new(fixtures.account_executives.clone())?;
        let synthesizer =
            QuoteSynthesizer::new(FixedRatePricingEngine::new(config.pricing_policy()), roster)
                .with_assignment(config.pricing.ae_assignment)
                .with_validity_days(config.pricing.validity_days);

        Ok(Self {
            catalog: Catalog::new(fixtures.products.clone()),
            selector: RecommendationSelector::default(),
            analyzer: RequirementsAnalyzer,
            synthesizer,
            engine: FlowEngine::default(),
        })
    }

    pub fn builtin() -> Result<Self, ApplicationError> {
        Self::new(&FixtureSet::builtin()?, &AppConfig::default())
    }
}

/// What one call into the session changed.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub from: ConversationPhase,
    pub phase: ConversationPhase,
    pub actions: Vec<PhaseAction>,
    pub messages: Vec<ChatMessage>,
}

impl TurnOutcome {
    pub fn advanced(&self) -> bool {
        self.from != self.phase
    }

    pub fn has_action(&self, action: PhaseAction) -> bool {
        self.actions.contains(&action)
    }
}

/// One customer chat. Owns the phase, the transcript and at most one quote.
pub struct SalesConversation {
    id: Uuid,
    services: Arc<SalesServices>,
    audit: Arc<dyn AuditSink>,
    phase: ConversationPhase,
    transcript: Transcript,
    customer: Option<CustomerInfo>,
    requirements: Option<CustomerRequirements>,
    recommendations: Vec<ServerProduct>,
    quote: Option<Quote>,
    pricing_trace: Option<PricingTrace>,
}

impl SalesConversation {
    /// Starts a chat in the greeting phase with the welcome message already posted.
    pub fn open(services: Arc<SalesServices>, audit: Arc<dyn AuditSink>, now: DateTime<Utc>) -> Self {
        let phase = services.engine.initial_phase();
        let mut conversation = Self {
            id: Uuid::new_v4(),
            services,
            audit,
            phase,
            transcript: Transcript::new(),
            customer: None,
            requirements: None,
            recommendations: Vec::new(),
            quote: None,
            pricing_trace: None,
        };
        conversation.transcript.push_agent(responses::GREETING, MessageKind::Text, None, now);
        tracing::debug!(
            event_name = "conversation.opened",
            conversation_id = %conversation.id,
            "conversation opened"
        );
        conversation
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn customer(&self) -> Option<&CustomerInfo> {
        self.customer.as_ref()
    }

    pub fn requirements(&self) -> Option<&CustomerRequirements> {
        self.requirements.as_ref()
    }

    pub fn recommendations(&self) -> &[ServerProduct] {
        &self.recommendations
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    pub fn pricing_trace(&self) -> Option<&PricingTrace> {
        self.pricing_trace.as_ref()
    }

    pub fn services(&self) -> &Arc<SalesServices> {
        &self.services
    }

    pub fn mark_quote_viewed(&mut self) -> bool {
        match self.quote.as_mut() {
            Some(quote) => {
                quote.mark_viewed();
                true
            }
            None => false,
        }
    }

    /// Whitespace-only input is ignored and returns `Ok(None)`.
    pub fn handle_user_message(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TurnOutcome>, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let offset = self.transcript.len();
        self.transcript.push_user(text, now);
        let event = PhaseEvent::user_message(self.phase, text);
        let outcome = self.apply(event, &FlowContext::default())?;
        self.perform(&outcome, Some(text), now)?;
        Ok(Some(self.finish(outcome, offset)))
    }

    /// Invalid forms return field errors and leave the phase untouched.
    pub fn submit_lead(&mut self, form: &LeadForm, now: DateTime<Utc>) -> Result<TurnOutcome, DomainError> {
        let customer = match form.validate() {
            Ok(customer) => customer,
            Err(errors) => {
                let context = FlowContext::missing(errors.missing_fields());
                return Err(match self.apply(PhaseEvent::LeadSubmitted, &context) {
                    Err(DomainError::FlowTransition(FlowTransitionError::MissingRequiredFields {
                        ..
                    }))
                    | Ok(_) => DomainError::InvalidLead(errors),
                    Err(other) => other,
                });
            }
        };

        let offset = self.transcript.len();
        let outcome = self.apply(PhaseEvent::LeadSubmitted, &FlowContext::default())?;
        self.customer = Some(customer);
        self.perform(&outcome, None, now)?;
        Ok(self.finish(outcome, offset))
    }

    pub fn approve_products(&mut self, now: DateTime<Utc>) -> Result<TurnOutcome, DomainError> {
        let offset = self.transcript.len();
        let outcome = self.apply(PhaseEvent::ProductsApproved, &FlowContext::default())?;
        self.perform(&outcome, None, now)?;
        Ok(self.finish(outcome, offset))
    }

    /// Synthesizes the quote for the approved recommendations and moves to completed.
    pub fn complete_quotation(&mut self, now: DateTime<Utc>) -> Result<TurnOutcome, DomainError> {
        let context = FlowContext::default();
        self.services.engine.apply(self.phase, PhaseEvent::QuoteReady, &context)?;

        let customer = self.customer.as_ref().ok_or_else(|| {
            DomainError::InvariantViolation("quotation requires a captured lead".to_string())
        })?;
        let synthesized =
            self.services.synthesizer.synthesize_products(customer, &self.recommendations, now)?;
        self.audit.emit(
            self.audit_context()
                .with_quote(synthesized.quote.id.clone())
                .event("quote.synthesized", AuditCategory::Pricing, AuditOutcome::Success)
                .with_metadata("total", synthesized.quote.pricing.total.to_string())
                .with_metadata("assigned_ae", synthesized.quote.assigned_ae.name.clone()),
        );
        self.quote = Some(synthesized.quote);
        self.pricing_trace = Some(synthesized.trace);

        let offset = self.transcript.len();
        let outcome = self.apply(PhaseEvent::QuoteReady, &context)?;
        self.perform(&outcome, None, now)?;
        Ok(self.finish(outcome, offset))
    }

    /// Discards everything and starts a fresh chat under a new id.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        tracing::info!(
            event_name = "conversation.reset",
            conversation_id = %self.id,
            phase = %self.phase,
            "conversation reset"
        );
        *self = Self::open(Arc::clone(&self.services), Arc::clone(&self.audit), now);
    }

    fn audit_context(&self) -> AuditContext {
        let context =
            AuditContext::new(self.id.to_string(), Uuid::new_v4().to_string(), CUSTOMER_ACTOR);
        match &self.quote {
            Some(quote) => context.with_quote(quote.id.clone()),
            None => context,
        }
    }

    fn apply(&mut self, event: PhaseEvent, context: &FlowContext) -> Result<TransitionOutcome, DomainError> {
        let audit = self.audit_context();
        let outcome = self.services.engine.apply_with_audit(
            self.phase,
            event,
            context,
            self.audit.as_ref(),
            &audit,
        )?;
        if outcome.advanced() {
            tracing::info!(
                event_name = "conversation.phase_changed",
                correlation_id = %audit.correlation_id,
                conversation_id = %self.id,
                from = %outcome.from,
                to = %outcome.to,
                "conversation phase changed"
            );
        }
        self.phase = outcome.to;
        Ok(outcome)
    }

    fn perform(
        &mut self,
        outcome: &TransitionOutcome,
        text: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        for action in &outcome.actions {
            match action {
                PhaseAction::PromptLeadCapture => {
                    self.say(responses::LEAD_PROMPT, MessageKind::LeadCapture, None, now);
                }
                PhaseAction::RepromptLeadCapture => {
                    self.say(responses::LEAD_REPROMPT, MessageKind::LeadCapture, None, now);
                }
                PhaseAction::AcknowledgeLead => {
                    let name =
                        self.customer.as_ref().map(|customer| customer.name.as_str()).unwrap_or("there");
                    let reply = responses::lead_acknowledgement(name);
                    self.say(reply, MessageKind::Text, None, now);
                }
                PhaseAction::SelectRecommendations => self.recommend(text.unwrap_or_default(), now),
                PhaseAction::AnswerFollowUp => {
                    let reply = responses::follow_up_answer(&self.recommendations);
                    self.say(reply, MessageKind::Text, None, now);
                }
                PhaseAction::AcknowledgeApproval => {
                    self.say(responses::APPROVAL_ACK, MessageKind::Text, None, now);
                }
                PhaseAction::ScheduleQuoteSynthesis => {}
                PhaseAction::ReportQuoteProgress => {
                    self.say(responses::QUOTE_IN_PROGRESS, MessageKind::Text, None, now);
                }
                PhaseAction::DeliverQuote => {
                    let quote = self.quote.clone().ok_or_else(|| {
                        DomainError::InvariantViolation("quote delivery without a quote".to_string())
                    })?;
                    let reply = responses::quote_delivery(&quote);
                    self.say(reply, MessageKind::Quote, Some(MessageAttachment::Quote(Box::new(quote))), now);
                }
                PhaseAction::EscalateToSupport => {
                    self.say(responses::ESCALATION, MessageKind::Text, None, now);
                }
                PhaseAction::AnnounceCompleted => {
                    self.say(responses::COMPLETED, MessageKind::Text, None, now);
                }
            }
        }
        Ok(())
    }

    fn recommend(&mut self, text: &str, now: DateTime<Utc>) {
        let requirements = self.services.analyzer.analyze(text);
        let recommendation = self.services.selector.select(&self.services.catalog, text);
        self.audit.emit(
            self.audit_context()
                .event("recommendation.selected", AuditCategory::Recommendation, AuditOutcome::Success)
                .with_metadata(
                    "use_case",
                    recommendation.matched.map(|use_case| use_case.as_str()).unwrap_or("fallback"),
                )
                .with_metadata(
                    "products",
                    recommendation
                        .products
                        .iter()
                        .map(|product| product.id.as_str())
                        .collect::<Vec<_>>()
                        .join(","),
                ),
        );

        let reply = responses::recommendation_summary(&recommendation.products, &requirements);
        let attachment = MessageAttachment::Products(recommendation.products.clone());
        self.say(reply, MessageKind::Recommendation, Some(attachment), now);
        self.requirements = Some(requirements);
        self.recommendations = recommendation.products;
    }

    fn say(
        &mut self,
        content: impl Into<String>,
        kind: MessageKind,
        attachment: Option<MessageAttachment>,
        now: DateTime<Utc>,
    ) {
        self.transcript.push_agent(content, kind, attachment, now);
    }

    fn finish(&self, outcome: TransitionOutcome, offset: usize) -> TurnOutcome {
        TurnOutcome {
            from: outcome.from,
            phase: outcome.to,
            actions: outcome.actions,
            messages: self.transcript.since(offset).to_vec(),
        }
    }
}
