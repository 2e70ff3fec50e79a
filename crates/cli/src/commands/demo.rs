use std::sync::Arc;

use salesdesk_agent::{AutoplayDemo, AutoplayEvent, TimingProfile};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::commands::{to_json_line, AppContext, CommandResult, GlobalOptions, EXIT_BAD_REQUEST, EXIT_RUNTIME};

const COMMAND: &str = "demo";

#[derive(Debug, Serialize)]
struct DemoSummary {
    demo_id: String,
    steps_fired: usize,
    cancelled: bool,
    quote_total: Option<i64>,
}

/// Plays one scripted demo, streaming each event as a JSON line.
pub async fn run(options: &GlobalOptions, scenario: Option<&str>, instant: bool) -> CommandResult {
    let context = match AppContext::load(options) {
        Ok(context) => context,
        Err(error) => return CommandResult::from_error(COMMAND, error),
    };
    let timing = if instant {
        TimingProfile::instant()
    } else {
        TimingProfile::from_config(&context.config.conversation)
    };
    let autoplay = match AutoplayDemo::new(
        context.fixtures.demo_conversations.clone(),
        Arc::clone(&context.services),
        timing,
    ) {
        Ok(autoplay) => Arc::new(autoplay),
        Err(error) => return CommandResult::from_error(COMMAND, error.into()),
    };
    if let Some(scenario) = scenario {
        if !autoplay.select(scenario) {
            let known: Vec<&str> = autoplay.demos().iter().map(|demo| demo.id.as_str()).collect();
            return CommandResult::failure(
                COMMAND,
                "bad_request",
                format!("unknown demo `{scenario}` (known: {})", known.join(", ")),
                EXIT_BAD_REQUEST,
            );
        }
    }

    let (sender, mut receiver) = mpsc::channel(32);
    let printer = tokio::spawn(async move {
        let mut quote_total = None;
        while let Some(event) = receiver.recv().await {
            if let AutoplayEvent::QuoteReady { quote, .. } = &event {
                quote_total = Some(quote.pricing.total);
            }
            println!("{}", to_json_line(&event));
        }
        quote_total
    });

    let playing = {
        let autoplay = Arc::clone(&autoplay);
        tokio::spawn(async move { autoplay.play(&sender).await })
    };
    let interrupt = {
        let autoplay = Arc::clone(&autoplay);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!(event_name = "cli.demo_interrupted", "demo interrupted, resetting");
                autoplay.reset();
            }
        })
    };

    let outcome = playing.await;
    interrupt.abort();
    let quote_total = printer.await.ok().flatten();

    match outcome {
        Ok(Ok(outcome)) => CommandResult::success_with_data(
            COMMAND,
            DemoSummary {
                demo_id: autoplay.current().id.clone(),
                steps_fired: outcome.fired(),
                cancelled: outcome.is_cancelled(),
                quote_total,
            },
        ),
        Ok(Err(error)) => CommandResult::failure(COMMAND, "runtime", error.to_string(), EXIT_RUNTIME),
        Err(error) => CommandResult::failure(COMMAND, "runtime", error.to_string(), EXIT_RUNTIME),
    }
}
