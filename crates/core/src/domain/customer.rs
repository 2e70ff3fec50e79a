use serde::{Deserialize, Serialize};

use crate::domain::product::UseCase;

/// Contact snapshot captured by the lead form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub company: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFactor {
    Rack,
    Tower,
    Blade,
}

impl FormFactor {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rack => "Rack Mount",
            Self::Tower => "Tower",
            Self::Blade => "Blade",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Entry,
    Mid,
    Enterprise,
}

/// Requirements inferred from a single customer turn. Rebuilt on every turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRequirements {
    pub use_cases: Vec<UseCase>,
    pub workload_type: String,
    pub user_count: Option<u32>,
    pub form_factor: Option<FormFactor>,
    pub budget_tier: Option<BudgetTier>,
    pub performance_needs: Vec<String>,
    pub follow_up_questions: Vec<String>,
}

impl CustomerRequirements {
    pub fn primary_use_case(&self) -> Option<UseCase> {
        self.use_cases.first().copied()
    }

    pub fn needs_more_info(&self) -> bool {
        !self.follow_up_questions.is_empty()
    }
}
