use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::account_executive::AccountExecutive;
use crate::domain::demo::{DemoConversation, MultiUserProfile};
use crate::domain::product::ServerProduct;

pub const BUILTIN_PRODUCTS: &str = include_str!("../fixtures/server_products.json");
pub const BUILTIN_ACCOUNT_EXECUTIVES: &str = include_str!("../fixtures/account_executives.json");
pub const BUILTIN_DEMO_CONVERSATIONS: &str = include_str!("../fixtures/demo_conversations.json");
pub const BUILTIN_MULTI_USER_SESSIONS: &str = include_str!("../fixtures/multi_user_sessions.json");

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {fixture} fixture: {message}")]
    Parse { fixture: &'static str, message: String },
    #[error("{fixture} fixture must contain at least one entry")]
    Empty { fixture: &'static str },
}

/// Optional per-fixture file overrides. `None` means the compiled-in copy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixturePaths {
    pub products: Option<PathBuf>,
    pub account_executives: Option<PathBuf>,
    pub demo_conversations: Option<PathBuf>,
    pub multi_user_sessions: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FixtureSet {
    pub products: Vec<ServerProduct>,
    pub account_executives: Vec<AccountExecutive>,
    pub demo_conversations: Vec<DemoConversation>,
    pub multi_user_sessions: Vec<MultiUserProfile>,
}

impl FixtureSet {
    pub fn builtin() -> Result<Self, FixtureError> {
        Self::load(&FixturePaths::default())
    }

    pub fn load(paths: &FixturePaths) -> Result<Self, FixtureError> {
        let fixtures = Self {
            products: load_list("products", paths.products.as_deref(), BUILTIN_PRODUCTS)?,
            account_executives: load_list(
                "account_executives",
                paths.account_executives.as_deref(),
                BUILTIN_ACCOUNT_EXECUTIVES,
            )?,
            demo_conversations: load_list(
                "demo_conversations",
                paths.demo_conversations.as_deref(),
                BUILTIN_DEMO_CONVERSATIONS,
            )?,
            multi_user_sessions: load_list(
                "multi_user_sessions",
                paths.multi_user_sessions.as_deref(),
                BUILTIN_MULTI_USER_SESSIONS,
            )?,
        };

        tracing::debug!(
            event_name = "fixtures.loaded",
            products = fixtures.products.len(),
            account_executives = fixtures.account_executives.len(),
            demo_conversations = fixtures.demo_conversations.len(),
            multi_user_sessions = fixtures.multi_user_sessions.len(),
            "fixtures loaded"
        );

        Ok(fixtures)
    }

    pub fn demo(&self, id: &str) -> Option<&DemoConversation> {
        self.demo_conversations.iter().find(|demo| demo.id == id)
    }
}

pub fn parse_list<T: DeserializeOwned>(
    fixture: &'static str,
    raw: &str,
) -> Result<Vec<T>, FixtureError> {
    let items: Vec<T> = serde_json::from_str(raw)
        .map_err(|error| FixtureError::Parse { fixture, message: error.to_string() })?;
    if items.is_empty() {
        return Err(FixtureError::Empty { fixture });
    }
    Ok(items)
}

fn load_list<T: DeserializeOwned>(
    fixture: &'static str,
    path: Option<&Path>,
    builtin: &str,
) -> Result<Vec<T>, FixtureError> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|source| FixtureError::Read { path: path.to_path_buf(), source })?;
            parse_list(fixture, &raw)
        }
        None => parse_list(fixture, builtin),
    }
}
