pub mod catalog;
pub mod chat;
pub mod config;
pub mod demo;
pub mod multi_user;
pub mod quote;
pub mod recommend;

use std::path::PathBuf;
use std::sync::Arc;

use salesdesk_agent::SalesServices;
use salesdesk_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use salesdesk_core::errors::{ApplicationError, InterfaceError};
use salesdesk_core::fixtures::FixtureSet;
use serde::Serialize;
use serde_json::Value;

pub const EXIT_RUNTIME: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_FIXTURE: u8 = 3;
pub const EXIT_BAD_REQUEST: u8 = 4;
pub const EXIT_EXPORT: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: Some(message.into()),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(command: &str, data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => {
                let payload = CommandOutcome {
                    command: command.to_string(),
                    status: "ok".to_string(),
                    error_class: None,
                    message: None,
                    data: Some(data),
                };
                Self { exit_code: 0, output: serialize_payload(payload) }
            }
            Err(error) => Self::failure(command, "serialization", error.to_string(), EXIT_RUNTIME),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: Some(message.into()),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Domain errors keep their detail; other classes show the user-safe text.
    pub fn from_error(command: &str, error: ApplicationError) -> Self {
        let (error_class, exit_code) = match &error {
            ApplicationError::Domain(_) => ("bad_request", EXIT_BAD_REQUEST),
            ApplicationError::Fixture(_) => ("fixture_load", EXIT_FIXTURE),
            ApplicationError::Export(_) => ("export_failure", EXIT_EXPORT),
            ApplicationError::Configuration(_) => ("config_validation", EXIT_CONFIG),
        };
        let detail = error.to_string();
        let interface = error.into_interface(command);
        let message = match interface {
            InterfaceError::BadRequest { message, .. } => message,
            other => format!("{} ({detail})", other.user_message()),
        };
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Flags shared by every subcommand.
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

impl GlobalOptions {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config_path.clone(),
            require_file: self.config_path.is_some(),
            overrides: self.overrides.clone(),
        }
    }
}

/// Loaded configuration, fixtures and the services built from them.
pub struct AppContext {
    pub config: AppConfig,
    pub fixtures: FixtureSet,
    pub services: Arc<SalesServices>,
}

impl AppContext {
    pub fn load(options: &GlobalOptions) -> Result<Self, ApplicationError> {
        let config = AppConfig::load(options.load_options())?;
        let fixtures = FixtureSet::load(&config.fixture_paths())?;
        let services = Arc::new(SalesServices::new(&fixtures, &config)?);
        Ok(Self { config, fixtures, services })
    }
}

pub fn to_json_line(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|error| {
        format!("{{\"type\":\"serialization_error\",\"message\":\"{}\"}}", error.to_string().replace('"', "'"))
    })
}
