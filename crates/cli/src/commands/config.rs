use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use salesdesk_core::config::{AppConfig, LogFormat};
use serde::Serialize;
use toml::Value;

use crate::commands::{CommandResult, GlobalOptions};

const COMMAND: &str = "config";

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    precedence: &'static str,
    file: Option<String>,
    entries: Vec<ConfigEntry>,
}

/// Effective configuration with the layer each value came from.
pub fn run(options: &GlobalOptions) -> CommandResult {
    let config = match AppConfig::load(options.load_options()) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error(COMMAND, error.into()),
    };

    let file_path = detect_config_path(options.config_path.as_deref());
    let file_doc = load_config_file_doc(file_path.as_deref());
    let sources = SourceResolver { options, file_doc: file_doc.as_ref(), file_path: file_path.as_deref() };

    let pricing = &config.pricing;
    let conversation = &config.conversation;
    let export = &config.export;
    let fixtures = &config.fixtures;

    let fields: Vec<(&'static str, String, Option<&'static str>)> = vec![
        ("pricing.discount_rate", pricing.discount_rate.to_string(), Some("SALESDESK_PRICING_DISCOUNT_RATE")),
        ("pricing.tax_rate", pricing.tax_rate.to_string(), Some("SALESDESK_PRICING_TAX_RATE")),
        ("pricing.rounding", pricing.rounding.as_str().to_string(), Some("SALESDESK_PRICING_ROUNDING")),
        ("pricing.currency", pricing.currency.clone(), Some("SALESDESK_PRICING_CURRENCY")),
        ("pricing.validity_days", pricing.validity_days.to_string(), Some("SALESDESK_PRICING_VALIDITY_DAYS")),
        (
            "pricing.ae_assignment",
            pricing.ae_assignment.as_str().to_string(),
            Some("SALESDESK_PRICING_AE_ASSIGNMENT"),
        ),
        (
            "conversation.typing_delay_ms",
            conversation.typing_delay_ms.to_string(),
            Some("SALESDESK_CONVERSATION_TYPING_DELAY_MS"),
        ),
        ("conversation.lead_handoff_delay_ms", conversation.lead_handoff_delay_ms.to_string(), None),
        ("conversation.quote_step_base_ms", conversation.quote_step_base_ms.to_string(), None),
        ("conversation.quote_step_interval_ms", conversation.quote_step_interval_ms.to_string(), None),
        ("conversation.autoplay_tail_ms", conversation.autoplay_tail_ms.to_string(), None),
        ("conversation.autoplay_quote_pause_ms", conversation.autoplay_quote_pause_ms.to_string(), None),
        (
            "conversation.multi_user_tick_ms",
            conversation.multi_user_tick_ms.to_string(),
            Some("SALESDESK_CONVERSATION_MULTI_USER_TICK_MS"),
        ),
        (
            "conversation.multi_user_ticks",
            conversation.multi_user_ticks.to_string(),
            Some("SALESDESK_CONVERSATION_MULTI_USER_TICKS"),
        ),
        ("fixtures.products_path", display_path(fixtures.products_path.as_deref()), Some("SALESDESK_FIXTURES_PRODUCTS_PATH")),
        (
            "fixtures.account_executives_path",
            display_path(fixtures.account_executives_path.as_deref()),
            Some("SALESDESK_FIXTURES_ACCOUNT_EXECUTIVES_PATH"),
        ),
        ("fixtures.demo_conversations_path", display_path(fixtures.demo_conversations_path.as_deref()), None),
        ("fixtures.multi_user_sessions_path", display_path(fixtures.multi_user_sessions_path.as_deref()), None),
        ("export.output_dir", export.output_dir.display().to_string(), Some("SALESDESK_EXPORT_OUTPUT_DIR")),
        ("export.pdf_enabled", export.pdf_enabled.to_string(), Some("SALESDESK_EXPORT_PDF_ENABLED")),
        (
            "export.wkhtmltopdf_path",
            display_path(export.wkhtmltopdf_path.as_deref()),
            Some("SALESDESK_EXPORT_WKHTMLTOPDF_PATH"),
        ),
        ("export.timeout_secs", export.timeout_secs.to_string(), None),
        ("logging.level", config.logging.level.clone(), Some("SALESDESK_LOGGING_LEVEL")),
        ("logging.format", log_format_name(config.logging.format).to_string(), Some("SALESDESK_LOGGING_FORMAT")),
    ];

    let entries = fields
        .into_iter()
        .map(|(key, value, env_key)| ConfigEntry { key, value, source: sources.source(key, env_key) })
        .collect();

    CommandResult::success_with_data(
        COMMAND,
        ConfigReport {
            precedence: "flag > env > file > default",
            file: file_path.map(|path| path.display().to_string()),
            entries,
        },
    )
}

struct SourceResolver<'a> {
    options: &'a GlobalOptions,
    file_doc: Option<&'a Value>,
    file_path: Option<&'a Path>,
}

impl SourceResolver<'_> {
    fn source(&self, key_path: &str, env_key: Option<&str>) -> String {
        if self.flag_overrides(key_path) {
            return "flag".to_string();
        }

        if let Some(env_key) = env_key {
            if env::var_os(env_key).is_some() {
                return format!("env ({env_key})");
            }
            if let Some(alias) = env_alias(env_key) {
                if env::var_os(alias).is_some() {
                    return format!("env ({alias})");
                }
            }
        }

        if let Some(doc) = self.file_doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .file_path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }

    fn flag_overrides(&self, key_path: &str) -> bool {
        let overrides = &self.options.overrides;
        match key_path {
            "logging.level" => overrides.log_level.is_some(),
            "logging.format" => overrides.log_format.is_some(),
            "export.output_dir" => overrides.output_dir.is_some(),
            "export.pdf_enabled" => overrides.pdf_enabled.is_some(),
            "pricing.ae_assignment" => overrides.ae_assignment.is_some(),
            "pricing.rounding" => overrides.rounding.is_some(),
            _ => false,
        }
    }
}

fn env_alias(env_key: &str) -> Option<&'static str> {
    match env_key {
        "SALESDESK_LOGGING_LEVEL" => Some("SALESDESK_LOG_LEVEL"),
        "SALESDESK_LOGGING_FORMAT" => Some("SALESDESK_LOG_FORMAT"),
        _ => None,
    }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("salesdesk.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/salesdesk.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_else(|| "<builtin>".to_string())
}

fn log_format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}
