use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerInfo;

const EMAIL_PATTERN: &str = r"\S+@\S+\.\S+";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    Name,
    Company,
    Email,
}

impl LeadField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Company => "company",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw lead-capture form input as typed by the visitor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadForm {
    pub name: String,
    pub company: String,
    pub email: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeadValidationErrors {
    errors: BTreeMap<LeadField, &'static str>,
}

impl fmt::Display for LeadValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lead form has invalid fields: {}", self.missing_fields().join(", "))
    }
}

impl std::error::Error for LeadValidationErrors {}

impl LeadValidationErrors {
    pub fn get(&self, field: LeadField) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = LeadField> + '_ {
        self.errors.keys().copied()
    }

    pub fn missing_fields(&self) -> Vec<String> {
        self.fields().map(|field| field.as_str().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl LeadForm {
    pub fn new(
        name: impl Into<String>,
        company: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), company: company.into(), email: email.into() }
    }

    /// Required-field and email-shape checks. No uniqueness check is performed.
    pub fn validate(&self) -> Result<CustomerInfo, LeadValidationErrors> {
        let mut errors = BTreeMap::new();
        let name = self.name.trim();
        let company = self.company.trim();
        let email = self.email.trim();

        if name.is_empty() {
            errors.insert(LeadField::Name, "Name is required");
        }
        if company.is_empty() {
            errors.insert(LeadField::Company, "Company is required");
        }
        if email.is_empty() {
            errors.insert(LeadField::Email, "Email is required");
        } else if !email_pattern().is_match(email) {
            errors.insert(LeadField::Email, "Please enter a valid email");
        }

        if !errors.is_empty() {
            return Err(LeadValidationErrors { errors });
        }

        Ok(CustomerInfo {
            name: name.to_string(),
            company: company.to_string(),
            email: email.to_string(),
            phone: None,
        })
    }
}
