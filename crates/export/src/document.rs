use salesdesk_core::domain::account_executive::AccountExecutive;
use salesdesk_core::domain::customer::CustomerInfo;
use salesdesk_core::domain::product::ServerProduct;
use salesdesk_core::domain::quote::{LineConfiguration, PricingBreakdown, Quote};
use serde::Serialize;

pub const DOCUMENT_TITLE: &str = "HPE ProLiant Server Quotation";
pub const VENDOR_NAME: &str = "HEWLETT PACKARD ENTERPRISE";
pub const TAGLINE: &str = "Advance. Don't just adapt.";

pub const STANDING_TERMS: [&str; 2] = [
    "Pricing includes standard warranty and support options.",
    "Final pricing may vary based on configuration and volume discounts.",
];

const DATE_FORMAT: &str = "%B %-d, %Y";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocumentLine {
    pub position: usize,
    pub model: String,
    pub description: String,
    pub category: Option<String>,
    pub form_factor: Option<String>,
    pub quantity: u32,
    pub unit_price: i64,
    pub line_total: i64,
    pub configuration: LineConfiguration,
}

/// Everything the quote template renders, with dates already formatted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuoteDocument {
    pub title: &'static str,
    pub vendor: &'static str,
    pub tagline: &'static str,
    pub quote_id: String,
    pub issued_on: String,
    pub valid_until: String,
    pub customer: CustomerInfo,
    pub account_executive: AccountExecutive,
    pub lines: Vec<DocumentLine>,
    pub pricing: PricingBreakdown,
    pub terms: Vec<String>,
}

impl QuoteDocument {
    /// `products` supplies catalog details (category, form factor) for matching lines.
    pub fn new(quote: &Quote, products: &[ServerProduct]) -> Self {
        let lines = quote
            .lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let product = products.iter().find(|product| product.id == line.product_id);
                DocumentLine {
                    position: index + 1,
                    model: line.model.clone(),
                    description: line.description.clone(),
                    category: product.map(|product| product.category.clone()),
                    form_factor: product.map(|product| product.specifications.form_factor.clone()),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.total_price,
                    configuration: line.configuration.clone(),
                }
            })
            .collect();

        Self {
            title: DOCUMENT_TITLE,
            vendor: VENDOR_NAME,
            tagline: TAGLINE,
            quote_id: quote.id.to_string(),
            issued_on: quote.created_at.format(DATE_FORMAT).to_string(),
            valid_until: quote.valid_until.format(DATE_FORMAT).to_string(),
            customer: quote.customer.clone(),
            account_executive: quote.assigned_ae.clone(),
            lines,
            pricing: quote.pricing.clone(),
            terms: terms(quote),
        }
    }

    pub fn total(&self) -> i64 {
        self.pricing.total
    }
}

/// The validity term follows the quote's own window.
fn terms(quote: &Quote) -> Vec<String> {
    let days = (quote.valid_until - quote.created_at).num_days();
    let unit = if days == 1 { "day" } else { "days" };
    std::iter::once(format!("This quote is valid for {days} {unit} from the date of issue."))
        .chain(STANDING_TERMS.iter().map(|term| term.to_string()))
        .collect()
}
