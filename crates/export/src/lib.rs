//! Quote document export.
//!
//! A [`QuoteDocument`] is rendered to HTML through an embedded Tera template
//! and, when `wkhtmltopdf` is available, converted to PDF. Without a converter
//! (or if conversion fails) the HTML itself is written.

pub mod document;
pub mod exporter;
pub mod pdf;
pub mod render;

use salesdesk_core::errors::ApplicationError;
use thiserror::Error;

pub use document::QuoteDocument;
pub use exporter::{export_filename, ExportFormat, ExportedQuote, QuoteExporter};
pub use pdf::{PdfConverter, WkhtmltopdfConverter};
pub use render::{format_money, QuoteRenderer};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("wkhtmltopdf did not finish within {secs}s")]
    Timeout { secs: u64 },
    #[error("rendered total `{rendered}` does not match quote total `{expected}`")]
    TotalMismatch { rendered: String, expected: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExportError> for ApplicationError {
    fn from(value: ExportError) -> Self {
        Self::Export(value.to_string())
    }
}
