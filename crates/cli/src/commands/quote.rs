use std::path::PathBuf;

use chrono::Utc;
use salesdesk_core::cpq::synthesizer::LineRequest;
use salesdesk_core::domain::lead::LeadForm;
use salesdesk_core::domain::product::ProductId;
use salesdesk_core::domain::quote::Quote;
use salesdesk_core::errors::{ApplicationError, DomainError};
use salesdesk_export::{ExportedQuote, QuoteDocument, QuoteExporter};
use serde::Serialize;

use crate::commands::{AppContext, CommandResult, GlobalOptions, EXIT_BAD_REQUEST};

const COMMAND: &str = "quote";

#[derive(Clone, Debug, Default)]
pub struct QuoteArgs {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: Option<String>,
    pub products: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub no_pdf: bool,
}

#[derive(Debug, Serialize)]
struct QuoteReport {
    quote: Quote,
    export: ExportedQuote,
}

/// `id` or `id:quantity`.
pub fn parse_product_arg(raw: &str) -> Result<(ProductId, u32), String> {
    let (id, quantity) = match raw.split_once(':') {
        Some((id, quantity)) => {
            let quantity = quantity
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid quantity in `{raw}` (expected id:quantity)"))?;
            (id, quantity)
        }
        None => (raw, 1),
    };
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing product id in `{raw}`"));
    }
    Ok((ProductId::new(id), quantity))
}

pub async fn run(options: &GlobalOptions, args: QuoteArgs) -> CommandResult {
    if args.products.is_empty() {
        return CommandResult::failure(COMMAND, "bad_request", "at least one --product is required", EXIT_BAD_REQUEST);
    }
    let mut requested = Vec::with_capacity(args.products.len());
    for raw in &args.products {
        match parse_product_arg(raw) {
            Ok(parsed) => requested.push(parsed),
            Err(message) => return CommandResult::failure(COMMAND, "bad_request", message, EXIT_BAD_REQUEST),
        }
    }

    let mut context = match AppContext::load(options) {
        Ok(context) => context,
        Err(error) => return CommandResult::from_error(COMMAND, error),
    };
    if let Some(dir) = args.output_dir.clone() {
        context.config.export.output_dir = dir;
    }
    if args.no_pdf {
        context.config.export.pdf_enabled = false;
    }

    match build_and_export(&context, &args, requested).await {
        Ok(report) => CommandResult::success_with_data(COMMAND, report),
        Err(error) => CommandResult::from_error(COMMAND, error),
    }
}

async fn build_and_export(
    context: &AppContext,
    args: &QuoteArgs,
    requested: Vec<(ProductId, u32)>,
) -> Result<QuoteReport, ApplicationError> {
    let mut customer = LeadForm::new(&args.name, &args.company, &args.email)
        .validate()
        .map_err(DomainError::from)?;
    customer.phone = args.phone.clone().filter(|phone| !phone.trim().is_empty());

    let catalog = &context.services.catalog;
    let requests = requested
        .into_iter()
        .map(|(id, quantity)| {
            catalog
                .find(&id)
                .cloned()
                .map(|product| LineRequest::new(product).with_quantity(quantity))
                .ok_or(DomainError::UnknownProduct(id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let quote = context.services.synthesizer.synthesize(&customer, requests, Utc::now())?.quote;
    let document = QuoteDocument::new(&quote, catalog.products());
    let exporter = QuoteExporter::from_config(&context.config.export)?;
    let export = exporter.export(&quote, &document).await?;
    tracing::info!(
        event_name = "cli.quote_exported",
        quote_id = %quote.id,
        format = export.format.extension(),
        path = %export.path.display(),
        "quote exported"
    );

    Ok(QuoteReport { quote, export })
}
