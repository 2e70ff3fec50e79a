use serde::Serialize;

use crate::commands::{AppContext, CommandResult, GlobalOptions};

const COMMAND: &str = "catalog";

#[derive(Debug, Serialize)]
struct CatalogEntry<'a> {
    id: &'a str,
    model: &'a str,
    category: &'a str,
    form_factor: &'a str,
    base_price: i64,
    use_cases: Vec<&'static str>,
}

pub fn run(options: &GlobalOptions) -> CommandResult {
    let context = match AppContext::load(options) {
        Ok(context) => context,
        Err(error) => return CommandResult::from_error(COMMAND, error),
    };

    let entries: Vec<CatalogEntry<'_>> = context
        .services
        .catalog
        .products()
        .iter()
        .map(|product| CatalogEntry {
            id: product.id.as_str(),
            model: &product.model,
            category: &product.category,
            form_factor: &product.specifications.form_factor,
            base_price: product.base_price(),
            use_cases: product.use_cases.iter().map(|use_case| use_case.as_str()).collect(),
        })
        .collect();

    CommandResult::success_with_data(COMMAND, entries)
}
