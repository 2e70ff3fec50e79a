use salesdesk_agent::{MultiUserDemo, MultiUserTotals, TimingProfile};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::commands::{to_json_line, AppContext, CommandResult, GlobalOptions, EXIT_RUNTIME};

const COMMAND: &str = "multi-user";

#[derive(Debug, Serialize)]
struct MultiUserSummary {
    sessions: usize,
    ticks: usize,
    cancelled: bool,
    totals: MultiUserTotals,
}

pub async fn run(options: &GlobalOptions, instant: bool) -> CommandResult {
    let context = match AppContext::load(options) {
        Ok(context) => context,
        Err(error) => return CommandResult::from_error(COMMAND, error),
    };
    let timing = if instant {
        TimingProfile::instant()
    } else {
        TimingProfile::from_config(&context.config.conversation)
    };
    let mut demo = MultiUserDemo::new(context.fixtures.multi_user_sessions.clone(), &timing);

    let token = CancellationToken::new();
    let interrupt = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };

    let (sender, mut receiver) = mpsc::channel(16);
    let printer = tokio::spawn(async move {
        while let Some(tick) = receiver.recv().await {
            println!("{}", to_json_line(&tick));
        }
    });

    let outcome = demo.run(&token, &sender).await;
    drop(sender);
    interrupt.abort();
    let _ = printer.await;

    match outcome {
        Ok(outcome) => CommandResult::success_with_data(
            COMMAND,
            MultiUserSummary {
                sessions: demo.sessions().len(),
                ticks: outcome.fired(),
                cancelled: outcome.is_cancelled(),
                totals: demo.totals(),
            },
        ),
        Err(error) => CommandResult::failure(COMMAND, "runtime", error.to_string(), EXIT_RUNTIME),
    }
}
