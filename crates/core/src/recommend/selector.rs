use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::domain::product::{ServerProduct, UseCase};

pub const FALLBACK_LIMIT: usize = 2;

/// One row of the priority table: any keyword hit maps the message to `use_case`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub use_case: UseCase,
    pub limit: usize,
}

impl KeywordRule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Evaluated top to bottom; the first matching row wins. Cross-category input
/// ("database and ai") resolves to whichever row comes first.
pub const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["virtualization", "vmware", "hyper-v"],
        use_case: UseCase::Virtualization,
        limit: 2,
    },
    KeywordRule { keywords: &["database", "sql", "oracle"], use_case: UseCase::Database, limit: 2 },
    KeywordRule { keywords: &["ai", "machine learning"], use_case: UseCase::AiMl, limit: 1 },
    KeywordRule {
        keywords: &["small", "office", "startup"],
        use_case: UseCase::SmallBusiness,
        limit: 2,
    },
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub matched: Option<UseCase>,
    pub products: Vec<ServerProduct>,
}

impl Recommendation {
    pub fn is_fallback(&self) -> bool {
        self.matched.is_none()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RecommendationSelector {
    rules: &'static [KeywordRule],
}

impl Default for RecommendationSelector {
    fn default() -> Self {
        Self { rules: KEYWORD_RULES }
    }
}

impl RecommendationSelector {
    pub fn with_rules(rules: &'static [KeywordRule]) -> Self {
        Self { rules }
    }

    pub fn matched_rule(&self, text: &str) -> Option<&'static KeywordRule> {
        let lowered = text.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    /// Never fails: unmatched input, or a matched tag with no products in the
    /// catalog, falls back to the head of the catalog.
    pub fn select(&self, catalog: &Catalog, text: &str) -> Recommendation {
        let tagged = self.matched_rule(text).and_then(|rule| {
            let products: Vec<ServerProduct> =
                catalog.tagged(rule.use_case).take(rule.limit).cloned().collect();
            (!products.is_empty()).then_some(Recommendation { matched: Some(rule.use_case), products })
        });
        let recommendation = tagged.unwrap_or_else(|| Recommendation {
            matched: None,
            products: catalog.products().iter().take(FALLBACK_LIMIT).cloned().collect(),
        });

        tracing::debug!(
            event_name = "recommendation.selected",
            matched = recommendation.matched.map(|use_case| use_case.as_str()).unwrap_or("fallback"),
            product_count = recommendation.products.len(),
            "recommendation selected"
        );

        recommendation
    }
}
