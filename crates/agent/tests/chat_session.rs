use std::sync::Arc;

use salesdesk_agent::{AgentRuntime, ConversationEvent, SalesServices, TimingProfile};
use salesdesk_core::audit::InMemoryAuditSink;
use salesdesk_core::domain::lead::LeadForm;
use salesdesk_core::domain::message::Sender;
use salesdesk_core::flows::ConversationPhase;
use tokio::sync::mpsc;

fn drain(receiver: &mut mpsc::Receiver<ConversationEvent>) -> Vec<ConversationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn chat_session_walks_every_phase_and_delivers_a_priced_quote() {
    let audit = Arc::new(InMemoryAuditSink::default());
    let services = Arc::new(SalesServices::builtin().expect("services"));
    let (runtime, mut receiver) = AgentRuntime::new(services, audit.clone(), TimingProfile::instant());

    runtime.open().await.expect("open");
    runtime.send_message("Hi, we're looking at new servers").await.expect("greeting");
    assert_eq!(runtime.phase().await, ConversationPhase::LeadCapture);

    runtime
        .submit_lead(&LeadForm::new("John Smith", "TechCorp Inc", "john@techcorp.com"))
        .await
        .expect("lead");
    assert_eq!(runtime.phase().await, ConversationPhase::Requirements);

    runtime
        .send_message("We need servers for virtualization with 50 VMs")
        .await
        .expect("requirements");
    assert_eq!(runtime.phase().await, ConversationPhase::Recommendation);

    runtime.send_message("Yes, please generate the quote").await.expect("approval");
    assert_eq!(runtime.phase().await, ConversationPhase::Completed);

    let quote = runtime.quote().await.expect("quote");
    assert_eq!(quote.lines.len(), 2);
    assert_eq!(quote.pricing.subtotal, 8_400 + quote.lines[1].total_price);
    assert_eq!(
        quote.pricing.total,
        quote.pricing.subtotal - quote.pricing.discount + quote.pricing.tax
    );
    assert!(!quote.viewed());
    assert!(runtime.mark_quote_viewed().await);

    let events = drain(&mut receiver);
    let phases: Vec<ConversationPhase> = events
        .iter()
        .filter_map(|event| match event {
            ConversationEvent::PhaseChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(phases, ConversationPhase::ALL[1..].to_vec());

    let agent_messages = events
        .iter()
        .filter(|event| {
            matches!(event, ConversationEvent::MessageAppended { message } if message.sender == Sender::Agent)
        })
        .count();
    assert!(agent_messages >= 6);

    let wire = serde_json::to_value(events.last().expect("last event")).expect("serialize");
    assert_eq!(wire["type"], "quote_ready");

    let audited = audit.event_types();
    assert_eq!(
        audited.iter().filter(|kind| kind.as_str() == "conversation.transition_applied").count(),
        5
    );
    assert!(audited.contains(&"quote.synthesized".to_string()));
}

#[tokio::test]
async fn messages_after_completion_do_not_create_a_second_quote() {
    let services = Arc::new(SalesServices::builtin().expect("services"));
    let (runtime, _receiver) =
        AgentRuntime::new(services, Arc::new(InMemoryAuditSink::default()), TimingProfile::instant());

    runtime.send_message("hello").await.expect("greeting");
    runtime.submit_lead(&LeadForm::new("A", "B", "a@b.co")).await.expect("lead");
    runtime.send_message("small office").await.expect("requirements");
    runtime.approve_products().await.expect("approval");
    let first = runtime.quote().await.expect("quote");

    let outcome = runtime.send_message("Can you quote again?").await.expect("turn").expect("turn");
    assert_eq!(outcome.phase, ConversationPhase::Completed);
    assert_eq!(runtime.quote().await.expect("quote").id, first.id);
}
