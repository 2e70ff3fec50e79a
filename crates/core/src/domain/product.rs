use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workload tag attached to catalog entries and inferred from customer text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseCase {
    Virtualization,
    Database,
    Web,
    AiMl,
    Enterprise,
    FileStorage,
    SmallBusiness,
}

impl UseCase {
    pub const ALL: [UseCase; 7] = [
        UseCase::Virtualization,
        UseCase::Database,
        UseCase::Web,
        UseCase::AiMl,
        UseCase::Enterprise,
        UseCase::FileStorage,
        UseCase::SmallBusiness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Virtualization => "virtualization",
            Self::Database => "database",
            Self::Web => "web",
            Self::AiMl => "ai-ml",
            Self::Enterprise => "enterprise",
            Self::FileStorage => "file-storage",
            Self::SmallBusiness => "small-business",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Virtualization => "Virtualization",
            Self::Database => "Database",
            Self::Web => "Web Applications",
            Self::AiMl => "AI/ML",
            Self::Enterprise => "Enterprise Apps",
            Self::FileStorage => "File & Storage",
            Self::SmallBusiness => "Small Business",
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseCase {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|use_case| use_case.as_str() == normalized)
            .ok_or_else(|| format!("unknown use case `{value}`"))
    }
}

/// Free-text hardware specification. Values are displayed verbatim and never parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specifications {
    pub processors: String,
    pub memory: String,
    pub storage: String,
    pub form_factor: String,
    pub power_supply: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPricing {
    /// Whole currency units.
    pub base_price: i64,
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProduct {
    pub id: ProductId,
    pub model: String,
    pub series: String,
    pub category: String,
    pub description: String,
    pub specifications: Specifications,
    pub pricing: ProductPricing,
    pub image_url: String,
    pub use_cases: Vec<UseCase>,
    #[serde(default)]
    pub target_workloads: Vec<String>,
}

impl ServerProduct {
    pub fn supports(&self, use_case: UseCase) -> bool {
        self.use_cases.contains(&use_case)
    }

    pub fn base_price(&self) -> i64 {
        self.pricing.base_price
    }
}

#[cfg(test)]
mod tests {
    use super::UseCase;

    #[test]
    fn use_case_tags_round_trip_through_their_wire_names() {
        for use_case in UseCase::ALL {
            let parsed: UseCase = use_case.as_str().parse().expect("known tag");
            assert_eq!(parsed, use_case);
        }
        assert_eq!(
            serde_json::to_string(&UseCase::AiMl).expect("serialize"),
            "\"ai-ml\"".to_string()
        );
    }

    #[test]
    fn unknown_use_case_is_rejected() {
        assert!("mainframe".parse::<UseCase>().is_err());
    }
}
