use serde::Serialize;

use salesdesk_core::domain::customer::CustomerRequirements;

use crate::commands::{AppContext, CommandResult, GlobalOptions, EXIT_BAD_REQUEST};

const COMMAND: &str = "recommend";

#[derive(Debug, Serialize)]
struct RecommendedProduct<'a> {
    id: &'a str,
    model: &'a str,
    base_price: i64,
}

#[derive(Debug, Serialize)]
struct RecommendReport<'a> {
    matched_use_case: Option<&'static str>,
    fallback: bool,
    products: Vec<RecommendedProduct<'a>>,
    requirements: CustomerRequirements,
}

pub fn run(options: &GlobalOptions, text: &str) -> CommandResult {
    if text.trim().is_empty() {
        return CommandResult::failure(COMMAND, "bad_request", "requirements text must not be empty", EXIT_BAD_REQUEST);
    }
    let context = match AppContext::load(options) {
        Ok(context) => context,
        Err(error) => return CommandResult::from_error(COMMAND, error),
    };

    let services = &context.services;
    let recommendation = services.selector.select(&services.catalog, text);
    let requirements = services.analyzer.analyze(text);
    let report = RecommendReport {
        matched_use_case: recommendation.matched.map(|use_case| use_case.as_str()),
        fallback: recommendation.is_fallback(),
        products: recommendation
            .products
            .iter()
            .map(|product| RecommendedProduct {
                id: product.id.as_str(),
                model: &product.model,
                base_price: product.base_price(),
            })
            .collect(),
        requirements,
    };

    CommandResult::success_with_data(COMMAND, report)
}
