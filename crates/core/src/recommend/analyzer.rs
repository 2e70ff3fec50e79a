use std::sync::OnceLock;

use regex::Regex;

use crate::domain::customer::{BudgetTier, CustomerRequirements, FormFactor};
use crate::domain::product::UseCase;

const USE_CASE_TABLE: &[(&[&str], UseCase)] = &[
    (&["virtualization", "vmware", "hyper-v", "vms", "virtual machine"], UseCase::Virtualization),
    (&["database", "sql", "oracle", "analytics"], UseCase::Database),
    (&["ai", "machine learning", "gpu", "inference"], UseCase::AiMl),
    (&["web", "hosting", "website", "e-commerce"], UseCase::Web),
    (&["file", "storage", "backup"], UseCase::FileStorage),
    (&["small", "office", "startup"], UseCase::SmallBusiness),
    (&["enterprise", "mission critical", "mission-critical"], UseCase::Enterprise),
];

const FORM_FACTOR_TABLE: &[(&str, FormFactor)] =
    &[("rack", FormFactor::Rack), ("tower", FormFactor::Tower), ("blade", FormFactor::Blade)];

const BUDGET_TABLE: &[(&[&str], BudgetTier)] = &[
    (&["tight budget", "cheap", "affordable", "low cost", "entry"], BudgetTier::Entry),
    (&["mid-range", "mid range", "moderate budget"], BudgetTier::Mid),
    (&["enterprise budget", "no budget limit", "premium"], BudgetTier::Enterprise),
];

const PERFORMANCE_TABLE: &[(&str, &str)] = &[
    ("high availability", "high availability"),
    ("redundan", "redundancy"),
    ("low latency", "low latency"),
    ("real-time", "real-time processing"),
    ("gpu", "GPU acceleration"),
    ("performance", "high performance"),
    ("scal", "scalability"),
];

fn user_count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d[\d,]*)\s*(?:\+\s*)?(users?|vms?|virtual machines?|employees|people|seats|staff)")
            .expect("user count pattern is a valid regex")
    })
}

/// Derives ephemeral requirements from one free-text turn. Informational only;
/// the phase engine never waits on its output.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequirementsAnalyzer;

impl RequirementsAnalyzer {
    pub fn analyze(&self, text: &str) -> CustomerRequirements {
        let lowered = text.to_lowercase();

        let use_cases: Vec<UseCase> = USE_CASE_TABLE
            .iter()
            .filter(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|(_, use_case)| *use_case)
            .collect();

        let user_count = user_count_pattern().captures(&lowered).and_then(|captures| {
            captures.get(1).and_then(|digits| digits.as_str().replace(',', "").parse::<u32>().ok())
        });

        let form_factor = FORM_FACTOR_TABLE
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, form_factor)| *form_factor);

        let budget_tier = BUDGET_TABLE
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|(_, tier)| *tier);

        let performance_needs = PERFORMANCE_TABLE
            .iter()
            .filter(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, need)| (*need).to_string())
            .collect();

        let workload_type = use_cases
            .first()
            .map(|use_case| use_case.label().to_string())
            .unwrap_or_else(|| "General purpose".to_string());

        let mut follow_up_questions = Vec::new();
        if use_cases.is_empty() {
            follow_up_questions
                .push("What type of workloads are you planning to run on these servers?".to_string());
        }
        if user_count.is_none() {
            follow_up_questions
                .push("Roughly how many users or virtual machines will this support?".to_string());
        }
        if form_factor.is_none() {
            follow_up_questions.push("Do you prefer rack, tower, or blade servers?".to_string());
        }

        CustomerRequirements {
            use_cases,
            workload_type,
            user_count,
            form_factor,
            budget_tier,
            performance_needs,
            follow_up_questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::customer::{BudgetTier, FormFactor};
    use crate::domain::product::UseCase;

    use super::RequirementsAnalyzer;

    #[test]
    fn extracts_use_case_and_vm_count() {
        let requirements =
            RequirementsAnalyzer.analyze("We need servers for virtualization with 50 VMs in a rack");

        assert_eq!(requirements.primary_use_case(), Some(UseCase::Virtualization));
        assert_eq!(requirements.user_count, Some(50));
        assert_eq!(requirements.form_factor, Some(FormFactor::Rack));
        assert!(!requirements.follow_up_questions.iter().any(|question| question.contains("how many")));
    }

    #[test]
    fn vague_input_produces_follow_up_questions() {
        let requirements = RequirementsAnalyzer.analyze("I don't know, just something general");

        assert!(requirements.use_cases.is_empty());
        assert_eq!(requirements.workload_type, "General purpose");
        assert_eq!(requirements.follow_up_questions.len(), 3);
        assert!(requirements.needs_more_info());
    }

    #[test]
    fn budget_and_performance_hints_are_collected() {
        let requirements = RequirementsAnalyzer
            .analyze("Affordable tower for 1,200 employees, needs high availability and backup");

        assert_eq!(requirements.budget_tier, Some(BudgetTier::Entry));
        assert_eq!(requirements.user_count, Some(1200));
        assert_eq!(requirements.form_factor, Some(FormFactor::Tower));
        assert!(requirements.use_cases.contains(&UseCase::FileStorage));
        assert_eq!(requirements.performance_needs, vec!["high availability".to_string()]);
    }
}
