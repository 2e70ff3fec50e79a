pub mod commands;
pub mod logging;

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use salesdesk_core::config::{AppConfig, ConfigOverrides, LogFormat, LoggingConfig};
use salesdesk_core::cpq::synthesizer::AeAssignment;

use crate::commands::{CommandResult, GlobalOptions, EXIT_RUNTIME};
use crate::commands::quote::QuoteArgs;

#[derive(Debug, Parser)]
#[command(
    name = "salesdesk",
    about = "Simulated HPE server sales desk",
    long_about = "Chat with a scripted sales agent, play demo conversations, and build or export server quotes.",
    after_help = "Examples:\n  salesdesk chat\n  salesdesk demo --scenario virtualization-demo --instant\n  salesdesk quote --name 'Jane Doe' --company Acme --email jane@acme.com --product proliant-dl380-gen11:2"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a salesdesk.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level or filter directive (overrides config and env)")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Log format: compact, pretty or json")]
    log_format: Option<LogFormat>,
    #[arg(long, global = true, value_parser = parse_ae_assignment, help = "Account executive assignment: first or random")]
    ae_assignment: Option<AeAssignment>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List the server catalog")]
    Catalog,
    #[command(about = "Show which servers a requirements message would be recommended")]
    Recommend {
        #[arg(help = "Free-text customer requirements")]
        text: Vec<String>,
    },
    #[command(about = "Start an interactive sales chat")]
    Chat {
        #[arg(long, help = "Skip typing and progress delays")]
        instant: bool,
    },
    #[command(about = "Play a scripted demo conversation as JSON lines")]
    Demo {
        #[arg(long, help = "Demo id to play (defaults to the first)")]
        scenario: Option<String>,
        #[arg(long, help = "Skip scripted pacing")]
        instant: bool,
    },
    #[command(name = "multi-user", about = "Simulate several concurrent customer sessions")]
    MultiUser {
        #[arg(long, help = "Skip the tick interval")]
        instant: bool,
    },
    #[command(about = "Build a quote directly and export it")]
    Quote {
        #[arg(long)]
        name: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long = "product", required = true, help = "Product id, optionally with :quantity (repeatable)")]
        products: Vec<String>,
        #[arg(long, help = "Directory the exported document is written to")]
        output_dir: Option<PathBuf>,
        #[arg(long, help = "Write HTML only, skipping PDF conversion")]
        no_pdf: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

fn parse_ae_assignment(raw: &str) -> Result<AeAssignment, String> {
    AeAssignment::parse(raw).ok_or_else(|| format!("unsupported assignment `{raw}` (expected first|random)"))
}

impl Cli {
    fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            config_path: self.config.clone(),
            overrides: ConfigOverrides {
                log_level: self.log_level.clone(),
                log_format: self.log_format,
                ae_assignment: self.ae_assignment,
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.global_options();

    let logging = AppConfig::load(options.load_options())
        .map(|config| config.logging)
        .unwrap_or_else(|_| LoggingConfig {
            level: options.overrides.log_level.clone().unwrap_or_else(|| "info".to_string()),
            format: options.overrides.log_format.unwrap_or(LogFormat::Compact),
        });
    logging::init_logging(&logging);

    let result = match cli.command {
        Command::Catalog => commands::catalog::run(&options),
        Command::Recommend { text } => commands::recommend::run(&options, &text.join(" ")),
        Command::Chat { instant } => block_on("chat", commands::chat::run(&options, instant)),
        Command::Demo { scenario, instant } => {
            block_on("demo", commands::demo::run(&options, scenario.as_deref(), instant))
        }
        Command::MultiUser { instant } => {
            block_on("multi-user", commands::multi_user::run(&options, instant))
        }
        Command::Quote { name, company, email, phone, products, output_dir, no_pdf } => {
            let args = QuoteArgs { name, company, email, phone, products, output_dir, no_pdf };
            block_on("quote", commands::quote::run(&options, args))
        }
        Command::Config => commands::config::run(&options),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

fn block_on(command: &str, future: impl Future<Output = CommandResult>) -> CommandResult {
    match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(future),
        Err(error) => CommandResult::failure(command, "runtime", error.to_string(), EXIT_RUNTIME),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn quote_accepts_repeated_products_and_global_flags() {
        let cli = Cli::try_parse_from([
            "salesdesk",
            "quote",
            "--name",
            "Jane Doe",
            "--company",
            "Acme",
            "--email",
            "jane@acme.com",
            "--product",
            "proliant-dl380-gen11:2",
            "--product",
            "proliant-ml30-gen11",
            "--ae-assignment",
            "random",
        ])
        .expect("parse");

        let options = cli.global_options();
        assert!(options.overrides.ae_assignment.is_some());
        match cli.command {
            Command::Quote { products, no_pdf, .. } => {
                assert_eq!(products.len(), 2);
                assert!(!no_pdf);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_assignment_is_rejected() {
        let parsed = Cli::try_parse_from(["salesdesk", "--ae-assignment", "roundrobin", "catalog"]);
        assert!(parsed.is_err());
    }
}
