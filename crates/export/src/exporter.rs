use std::path::{Path, PathBuf};
use std::time::Duration;

use salesdesk_core::config::ExportConfig;
use salesdesk_core::domain::quote::Quote;
use serde::Serialize;

use crate::document::QuoteDocument;
use crate::pdf::{PdfConverter, WkhtmltopdfConverter};
use crate::render::{format_money, QuoteRenderer};
use crate::ExportError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportedQuote {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub bytes: usize,
}

/// `HPE-Quote-{quote id}-{customer name slug}.{ext}`
pub fn export_filename(quote: &Quote, format: ExportFormat) -> String {
    format!("HPE-Quote-{}-{}.{}", quote.id, slugify(&quote.customer.name), format.extension())
}

fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "customer".to_string()
    } else {
        slug.to_string()
    }
}

pub struct QuoteExporter {
    renderer: QuoteRenderer,
    converter: Option<Box<dyn PdfConverter>>,
    output_dir: PathBuf,
}

impl QuoteExporter {
    pub fn new(
        renderer: QuoteRenderer,
        converter: Option<Box<dyn PdfConverter>>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self { renderer, converter, output_dir: output_dir.into() }
    }

    /// PDF when enabled and a converter is found, HTML otherwise.
    pub fn from_config(config: &ExportConfig) -> Result<Self, ExportError> {
        let converter = if config.pdf_enabled {
            let timeout = Duration::from_secs(config.timeout_secs);
            let found = WkhtmltopdfConverter::discover(config.wkhtmltopdf_path.as_deref(), timeout);
            if found.is_none() {
                tracing::warn!(
                    event_name = "export.converter_missing",
                    "wkhtmltopdf not found; quotes will be exported as HTML"
                );
            }
            found.map(|converter| Box::new(converter) as Box<dyn PdfConverter>)
        } else {
            None
        };
        Ok(Self::new(QuoteRenderer::embedded()?, converter, config.output_dir.clone()))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn renders_pdf(&self) -> bool {
        self.converter.is_some()
    }

    pub async fn export(&self, quote: &Quote, document: &QuoteDocument) -> Result<ExportedQuote, ExportError> {
        let html = self.renderer.render_html(document)?;
        let expected = format_money(quote.pricing.total);
        let rendered = rendered_total(&html).unwrap_or_default();
        if rendered != expected {
            return Err(ExportError::TotalMismatch { rendered: rendered.to_string(), expected });
        }

        let (format, bytes) = match &self.converter {
            Some(converter) => match converter.convert(&html).await {
                Ok(pdf) => (ExportFormat::Pdf, pdf),
                Err(error) => {
                    tracing::warn!(
                        event_name = "export.pdf_fallback",
                        quote_id = %quote.id,
                        error = %error,
                        "PDF conversion failed, falling back to HTML"
                    );
                    (ExportFormat::Html, html.into_bytes())
                }
            },
            None => (ExportFormat::Html, html.into_bytes()),
        };

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(export_filename(quote, format));
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(
            event_name = "export.written",
            quote_id = %quote.id,
            format = format.extension(),
            path = %path.display(),
            size = bytes.len(),
            "quote exported"
        );
        Ok(ExportedQuote { path, format, bytes: bytes.len() })
    }
}

const GRAND_TOTAL_CELL: &str = "id=\"grand-total\">";

/// Text of the grand-total cell in a rendered document.
fn rendered_total(html: &str) -> Option<&str> {
    let start = html.find(GRAND_TOTAL_CELL)? + GRAND_TOTAL_CELL.len();
    let end = html[start..].find('<')?;
    Some(html[start..start + end].trim())
}
