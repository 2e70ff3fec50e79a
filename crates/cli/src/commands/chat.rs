use std::io::Write;
use std::sync::Arc;

use salesdesk_agent::{AgentRuntime, ConversationEvent, TimingProfile};
use salesdesk_core::audit::NoopAuditSink;
use salesdesk_core::domain::lead::LeadForm;
use salesdesk_core::domain::message::Sender;
use salesdesk_core::errors::DomainError;
use salesdesk_core::flows::ConversationPhase;
use salesdesk_export::{format_money, QuoteDocument, QuoteExporter};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::commands::{AppContext, CommandResult, GlobalOptions, EXIT_RUNTIME};

const COMMAND: &str = "chat";
const HELP: &str = "commands: /reset starts over, /export saves the delivered quote, /quit exits";

type InputLines = Lines<BufReader<Stdin>>;

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

    let (runtime, mut events) =
        AgentRuntime::new(Arc::clone(&context.services), Arc::new(NoopAuditSink), timing);
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    let outcome = drive(&context, &runtime).await;
    drop(runtime);
    let _ = printer.await;

    match outcome {
        Ok(turns) => CommandResult::success(COMMAND, format!("chat ended after {turns} messages")),
        Err(error) => CommandResult::failure(COMMAND, "runtime", error.to_string(), EXIT_RUNTIME),
    }
}

async fn drive(context: &AppContext, runtime: &AgentRuntime) -> anyhow::Result<usize> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut turns = 0;
    println!("{HELP}");
    runtime.open().await?;

    loop {
        let Some(line) = read_line(&mut lines, "you> ").await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/reset" => runtime.reset().await?,
            "/export" => export(context, runtime).await,
            text => {
                turns += 1;
                if let Err(error) = runtime.send_message(text).await {
                    eprintln!("error: {error}");
                    continue;
                }
                if runtime.phase().await == ConversationPhase::LeadCapture
                    && !capture_lead(runtime, &mut lines).await?
                {
                    break;
                }
            }
        }
    }
    Ok(turns)
}

/// Prompts for the lead form until it validates. `false` when input ended.
async fn capture_lead(runtime: &AgentRuntime, lines: &mut InputLines) -> anyhow::Result<bool> {
    loop {
        let Some(name) = read_line(lines, "  name: ").await? else { return Ok(false) };
        let Some(company) = read_line(lines, "  company: ").await? else { return Ok(false) };
        let Some(email) = read_line(lines, "  email: ").await? else { return Ok(false) };

        match runtime.submit_lead(&LeadForm::new(name, company, email)).await {
            Ok(_) => return Ok(true),
            Err(error) => match error.downcast_ref::<DomainError>() {
                Some(DomainError::InvalidLead(errors)) => {
                    for field in errors.fields() {
                        eprintln!("  {field}: {}", errors.get(field).unwrap_or("invalid"));
                    }
                }
                _ => return Err(error),
            },
        }
    }
}

async fn read_line(lines: &mut InputLines, prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    tokio::select! {
        line = lines.next_line() => Ok(line?),
        _ = tokio::signal::ctrl_c() => Ok(None),
    }
}

async fn export(context: &AppContext, runtime: &AgentRuntime) {
    let Some(quote) = runtime.quote().await else {
        eprintln!("no quote has been delivered yet");
        return;
    };
    let document = QuoteDocument::new(&quote, context.services.catalog.products());
    let result = match QuoteExporter::from_config(&context.config.export) {
        Ok(exporter) => exporter.export(&quote, &document).await,
        Err(error) => Err(error),
    };
    match result {
        Ok(exported) => {
            runtime.mark_quote_viewed().await;
            println!("[saved {}]", exported.path.display());
        }
        Err(error) => eprintln!("export failed: {error}"),
    }
}

fn print_event(event: &ConversationEvent) {
    match event {
        ConversationEvent::MessageAppended { message } if message.sender == Sender::Agent => {
            println!("\nagent> {}\n", message.content);
        }
        ConversationEvent::MessageAppended { .. } => {}
        ConversationEvent::Typing { active: true } => println!("agent is typing..."),
        ConversationEvent::Typing { active: false } => {}
        ConversationEvent::PhaseChanged { from, to } => println!("[phase {from} -> {to}]"),
        ConversationEvent::LeadFormRequested => println!("[lead form] please enter your details"),
        ConversationEvent::QuoteProgress { progress } => {
            println!("[{:>3}%] {} ({})", progress.percent, progress.label, progress.detail);
        }
        ConversationEvent::QuoteReady { quote } => println!(
            "[quote {} ready, total {}; /export saves it]",
            quote.id,
            format_money(quote.pricing.total)
        ),
        ConversationEvent::Reset { conversation_id } => println!("[new chat {conversation_id}]"),
    }
}
