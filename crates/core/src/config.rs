use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::pricing::{PricingPolicy, RoundingRule};
use crate::cpq::synthesizer::AeAssignment;
use crate::fixtures::FixturePaths;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub conversation: ConversationConfig,
    pub fixtures: FixturesConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricingConfig {
    pub discount_rate: Decimal,
    pub tax_rate: Decimal,
    pub rounding: RoundingRule,
    pub currency: String,
    pub validity_days: i64,
    pub ae_assignment: AeAssignment,
}

/// Pacing of the simulated agent. All values are milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationConfig {
    pub typing_delay_ms: u64,
    pub lead_handoff_delay_ms: u64,
    pub quote_step_base_ms: u64,
    pub quote_step_interval_ms: u64,
    pub autoplay_tail_ms: u64,
    pub autoplay_quote_pause_ms: u64,
    pub multi_user_tick_ms: u64,
    pub multi_user_ticks: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FixturesConfig {
    pub products_path: Option<PathBuf>,
    pub account_executives_path: Option<PathBuf>,
    pub demo_conversations_path: Option<PathBuf>,
    pub multi_user_sessions_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub pdf_enabled: bool,
    pub wkhtmltopdf_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub output_dir: Option<PathBuf>,
    pub pdf_enabled: Option<bool>,
    pub ae_assignment: Option<AeAssignment>,
    pub rounding: Option<RoundingRule>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let policy = PricingPolicy::default();
        Self {
            pricing: PricingConfig {
                discount_rate: policy.discount_rate,
                tax_rate: policy.tax_rate,
                rounding: policy.rounding,
                currency: policy.currency,
                validity_days: 30,
                ae_assignment: AeAssignment::First,
            },
            conversation: ConversationConfig {
                typing_delay_ms: 1_000,
                lead_handoff_delay_ms: 1_000,
                quote_step_base_ms: 500,
                quote_step_interval_ms: 800,
                autoplay_tail_ms: 3_000,
                autoplay_quote_pause_ms: 5_000,
                multi_user_tick_ms: 3_000,
                multi_user_ticks: 4,
            },
            fixtures: FixturesConfig::default(),
            export: ExportConfig {
                output_dir: PathBuf::from("quotes"),
                pdf_enabled: true,
                wkhtmltopdf_path: None,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("salesdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            discount_rate: self.pricing.discount_rate,
            tax_rate: self.pricing.tax_rate,
            rounding: self.pricing.rounding,
            currency: self.pricing.currency.clone(),
        }
    }

    pub fn fixture_paths(&self) -> FixturePaths {
        FixturePaths {
            products: self.fixtures.products_path.clone(),
            account_executives: self.fixtures.account_executives_path.clone(),
            demo_conversations: self.fixtures.demo_conversations_path.clone(),
            multi_user_sessions: self.fixtures.multi_user_sessions_path.clone(),
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricing) = patch.pricing {
            if let Some(discount_rate) = pricing.discount_rate {
                self.pricing.discount_rate = discount_rate;
            }
            if let Some(tax_rate) = pricing.tax_rate {
                self.pricing.tax_rate = tax_rate;
            }
            if let Some(rounding) = pricing.rounding {
                self.pricing.rounding = rounding;
            }
            if let Some(currency) = pricing.currency {
                self.pricing.currency = currency;
            }
            if let Some(validity_days) = pricing.validity_days {
                self.pricing.validity_days = validity_days;
            }
            if let Some(ae_assignment) = pricing.ae_assignment {
                self.pricing.ae_assignment = ae_assignment;
            }
        }

        if let Some(conversation) = patch.conversation {
            let target = &mut self.conversation;
            let fields = [
                (conversation.typing_delay_ms, &mut target.typing_delay_ms),
                (conversation.lead_handoff_delay_ms, &mut target.lead_handoff_delay_ms),
                (conversation.quote_step_base_ms, &mut target.quote_step_base_ms),
                (conversation.quote_step_interval_ms, &mut target.quote_step_interval_ms),
                (conversation.autoplay_tail_ms, &mut target.autoplay_tail_ms),
                (conversation.autoplay_quote_pause_ms, &mut target.autoplay_quote_pause_ms),
                (conversation.multi_user_tick_ms, &mut target.multi_user_tick_ms),
            ];
            for (value, slot) in fields {
                if let Some(value) = value {
                    *slot = value;
                }
            }
            if let Some(multi_user_ticks) = conversation.multi_user_ticks {
                target.multi_user_ticks = multi_user_ticks;
            }
        }

        if let Some(fixtures) = patch.fixtures {
            if let Some(path) = fixtures.products_path {
                self.fixtures.products_path = Some(path);
            }
            if let Some(path) = fixtures.account_executives_path {
                self.fixtures.account_executives_path = Some(path);
            }
            if let Some(path) = fixtures.demo_conversations_path {
                self.fixtures.demo_conversations_path = Some(path);
            }
            if let Some(path) = fixtures.multi_user_sessions_path {
                self.fixtures.multi_user_sessions_path = Some(path);
            }
        }

        if let Some(export) = patch.export {
            if let Some(output_dir) = export.output_dir {
                self.export.output_dir = output_dir;
            }
            if let Some(pdf_enabled) = export.pdf_enabled {
                self.export.pdf_enabled = pdf_enabled;
            }
            if let Some(path) = export.wkhtmltopdf_path {
                self.export.wkhtmltopdf_path = Some(path);
            }
            if let Some(timeout_secs) = export.timeout_secs {
                self.export.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SALESDESK_PRICING_DISCOUNT_RATE") {
            self.pricing.discount_rate = parse_decimal("SALESDESK_PRICING_DISCOUNT_RATE", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_PRICING_TAX_RATE") {
            self.pricing.tax_rate = parse_decimal("SALESDESK_PRICING_TAX_RATE", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_PRICING_ROUNDING") {
            self.pricing.rounding =
                RoundingRule::parse(&value).ok_or_else(|| invalid("SALESDESK_PRICING_ROUNDING", &value))?;
        }
        if let Some(value) = read_env("SALESDESK_PRICING_CURRENCY") {
            self.pricing.currency = value;
        }
        if let Some(value) = read_env("SALESDESK_PRICING_VALIDITY_DAYS") {
            self.pricing.validity_days = parse_i64("SALESDESK_PRICING_VALIDITY_DAYS", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_PRICING_AE_ASSIGNMENT") {
            self.pricing.ae_assignment = AeAssignment::parse(&value)
                .ok_or_else(|| invalid("SALESDESK_PRICING_AE_ASSIGNMENT", &value))?;
        }

        if let Some(value) = read_env("SALESDESK_CONVERSATION_TYPING_DELAY_MS") {
            self.conversation.typing_delay_ms =
                parse_u64("SALESDESK_CONVERSATION_TYPING_DELAY_MS", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_CONVERSATION_MULTI_USER_TICK_MS") {
            self.conversation.multi_user_tick_ms =
                parse_u64("SALESDESK_CONVERSATION_MULTI_USER_TICK_MS", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_CONVERSATION_MULTI_USER_TICKS") {
            self.conversation.multi_user_ticks =
                parse_u32("SALESDESK_CONVERSATION_MULTI_USER_TICKS", &value)?;
        }

        if let Some(value) = read_env("SALESDESK_FIXTURES_PRODUCTS_PATH") {
            self.fixtures.products_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("SALESDESK_FIXTURES_ACCOUNT_EXECUTIVES_PATH") {
            self.fixtures.account_executives_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("SALESDESK_EXPORT_OUTPUT_DIR") {
            self.export.output_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SALESDESK_EXPORT_PDF_ENABLED") {
            self.export.pdf_enabled = parse_bool("SALESDESK_EXPORT_PDF_ENABLED", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_EXPORT_WKHTMLTOPDF_PATH") {
            self.export.wkhtmltopdf_path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("SALESDESK_LOGGING_LEVEL").or_else(|| read_env("SALESDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SALESDESK_LOGGING_FORMAT").or_else(|| read_env("SALESDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.export.output_dir = output_dir;
        }
        if let Some(pdf_enabled) = overrides.pdf_enabled {
            self.export.pdf_enabled = pdf_enabled;
        }
        if let Some(ae_assignment) = overrides.ae_assignment {
            self.pricing.ae_assignment = ae_assignment;
        }
        if let Some(rounding) = overrides.rounding {
            self.pricing.rounding = rounding;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        validate_conversation(&self.conversation)?;
        validate_export(&self.export)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("salesdesk.toml"), PathBuf::from("config/salesdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    let unit_range = Decimal::ZERO..Decimal::ONE;
    if !unit_range.contains(&pricing.discount_rate) {
        return Err(ConfigError::Validation(
            "pricing.discount_rate must be a fraction in range 0..1 (e.g. 0.10)".to_string(),
        ));
    }
    if !unit_range.contains(&pricing.tax_rate) {
        return Err(ConfigError::Validation(
            "pricing.tax_rate must be a fraction in range 0..1 (e.g. 0.08)".to_string(),
        ));
    }

    let currency = pricing.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(format!(
            "pricing.currency must be a three-letter ISO code such as USD, got `{currency}`"
        )));
    }

    if !(1..=365).contains(&pricing.validity_days) {
        return Err(ConfigError::Validation(
            "pricing.validity_days must be in range 1..=365".to_string(),
        ));
    }

    Ok(())
}

fn validate_conversation(conversation: &ConversationConfig) -> Result<(), ConfigError> {
    const MAX_DELAY_MS: u64 = 60_000;
    let delays = [
        ("conversation.typing_delay_ms", conversation.typing_delay_ms),
        ("conversation.lead_handoff_delay_ms", conversation.lead_handoff_delay_ms),
        ("conversation.quote_step_base_ms", conversation.quote_step_base_ms),
        ("conversation.quote_step_interval_ms", conversation.quote_step_interval_ms),
        ("conversation.autoplay_tail_ms", conversation.autoplay_tail_ms),
        ("conversation.autoplay_quote_pause_ms", conversation.autoplay_quote_pause_ms),
        ("conversation.multi_user_tick_ms", conversation.multi_user_tick_ms),
    ];
    if let Some((key, _)) = delays.iter().find(|(_, value)| *value > MAX_DELAY_MS) {
        return Err(ConfigError::Validation(format!("{key} must be at most {MAX_DELAY_MS}")));
    }

    if conversation.multi_user_tick_ms == 0 {
        return Err(ConfigError::Validation(
            "conversation.multi_user_tick_ms must be greater than zero".to_string(),
        ));
    }

    if conversation.multi_user_ticks == 0 {
        return Err(ConfigError::Validation(
            "conversation.multi_user_ticks must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_export(export: &ExportConfig) -> Result<(), ConfigError> {
    if export.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("export.output_dir must not be empty".to_string()));
    }

    if export.timeout_secs == 0 || export.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "export.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid(key, value))
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| invalid(key, value))
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value.trim()).map_err(|_| invalid(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    conversation: Option<ConversationPatch>,
    fixtures: Option<FixturesPatch>,
    export: Option<ExportPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    discount_rate: Option<Decimal>,
    tax_rate: Option<Decimal>,
    rounding: Option<RoundingRule>,
    currency: Option<String>,
    validity_days: Option<i64>,
    ae_assignment: Option<AeAssignment>,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationPatch {
    typing_delay_ms: Option<u64>,
    lead_handoff_delay_ms: Option<u64>,
    quote_step_base_ms: Option<u64>,
    quote_step_interval_ms: Option<u64>,
    autoplay_tail_ms: Option<u64>,
    autoplay_quote_pause_ms: Option<u64>,
    multi_user_tick_ms: Option<u64>,
    multi_user_ticks: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct FixturesPatch {
    products_path: Option<PathBuf>,
    account_executives_path: Option<PathBuf>,
    demo_conversations_path: Option<PathBuf>,
    multi_user_sessions_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportPatch {
    output_dir: Option<PathBuf>,
    pdf_enabled: Option<bool>,
    wkhtmltopdf_path: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use crate::cpq::pricing::RoundingRule;
    use crate::cpq::synthesizer::AeAssignment;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_reference_pricing_and_pacing() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.pricing.discount_rate == Decimal::new(10, 2), "discount defaults to 10%")?;
        ensure(config.pricing.tax_rate == Decimal::new(8, 2), "tax defaults to 8%")?;
        ensure(config.pricing.rounding == RoundingRule::HalfUp, "rounding defaults to half up")?;
        ensure(config.pricing.validity_days == 30, "quotes are valid for 30 days")?;
        ensure(config.pricing.ae_assignment == AeAssignment::First, "ae assignment is deterministic")?;
        ensure(config.conversation.typing_delay_ms == 1_000, "typing delay is one second")?;
        ensure(config.conversation.multi_user_ticks == 4, "multi-user demo runs four ticks")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact logs by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SALESDESK_QUOTE_DIR", "/tmp/salesdesk-quotes");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("salesdesk.toml");
            fs::write(
                &path,
                r#"
[export]
output_dir = "${TEST_SALESDESK_QUOTE_DIR}"
pdf_enabled = false

[pricing]
tax_rate = "0.0725"
rounding = "half_even"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.export.output_dir == PathBuf::from("/tmp/salesdesk-quotes"),
                "output dir should be interpolated from environment",
            )?;
            ensure(!config.export.pdf_enabled, "pdf export should be disabled by file")?;
            ensure(config.pricing.tax_rate == Decimal::new(725, 4), "tax rate from file")?;
            ensure(config.pricing.rounding == RoundingRule::HalfEven, "rounding from file")?;
            Ok(())
        })();

        clear_vars(&["TEST_SALESDESK_QUOTE_DIR"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESDESK_LOG_LEVEL", "warn");
        env::set_var("SALESDESK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["SALESDESK_LOG_LEVEL", "SALESDESK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESDESK_EXPORT_OUTPUT_DIR", "from-env");
        env::set_var("SALESDESK_PRICING_AE_ASSIGNMENT", "random");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("salesdesk.toml");
            fs::write(
                &path,
                r#"
[export]
output_dir = "from-file"

[pricing]
ae_assignment = "first"
currency = "EUR"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    output_dir: Some(PathBuf::from("from-override")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.export.output_dir == PathBuf::from("from-override"),
                "override output dir should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.pricing.ae_assignment == AeAssignment::Random,
                "env ae assignment should win over file and defaults",
            )?;
            ensure(config.pricing.currency == "EUR", "file currency should win over defaults")?;
            Ok(())
        })();

        clear_vars(&["SALESDESK_EXPORT_OUTPUT_DIR", "SALESDESK_PRICING_AE_ASSIGNMENT"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESDESK_PRICING_TAX_RATE", "8");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("pricing.tax_rate")
            );
            ensure(has_message, "validation failure should mention pricing.tax_rate")
        })();

        clear_vars(&["SALESDESK_PRICING_TAX_RATE"]);
        result
    }

    #[test]
    fn zero_multi_user_tick_is_rejected() -> Result<(), String> {
        let mut config = AppConfig::default();
        config.conversation.multi_user_tick_ms = 0;

        let rejected = matches!(
            config.validate(),
            Err(ConfigError::Validation(ref message)) if message.contains("conversation.multi_user_tick_ms")
        );
        ensure(rejected, "a zero multi-user tick should fail validation")
    }

    #[test]
    fn malformed_env_values_are_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESDESK_PRICING_ROUNDING", "truncate");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected invalid env override".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. } if key == "SALESDESK_PRICING_ROUNDING"
                ),
                "invalid override should name the variable",
            )
        })();

        clear_vars(&["SALESDESK_PRICING_ROUNDING"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let result = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
