//! HTML to PDF conversion through an external `wkhtmltopdf` binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::ExportError;

#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, html: &str) -> Result<Vec<u8>, ExportError>;
}

#[derive(Clone, Debug)]
pub struct WkhtmltopdfConverter {
    binary: PathBuf,
    timeout: Duration,
}

impl WkhtmltopdfConverter {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { binary: binary.into(), timeout }
    }

    /// Uses `configured` when given, otherwise looks `wkhtmltopdf` up on PATH.
    pub fn discover(configured: Option<&Path>, timeout: Duration) -> Option<Self> {
        let binary = match configured {
            Some(path) => which::which(path).ok()?,
            None => which::which("wkhtmltopdf").ok()?,
        };
        tracing::debug!(
            event_name = "export.converter_found",
            path = %binary.display(),
            "wkhtmltopdf found"
        );
        Some(Self::new(binary, timeout))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl PdfConverter for WkhtmltopdfConverter {
    async fn convert(&self, html: &str) -> Result<Vec<u8>, ExportError> {
        let temp_dir = std::env::temp_dir();
        let stem = uuid::Uuid::new_v4();
        let html_path = temp_dir.join(format!("quote_{stem}.html"));
        let pdf_path = temp_dir.join(format!("quote_{stem}.pdf"));

        tokio::fs::write(&html_path, html).await?;

        let run = Command::new(&self.binary)
            .args(["--page-size", "A4"])
            .args(["--margin-top", "10mm", "--margin-bottom", "10mm"])
            .args(["--margin-left", "10mm", "--margin-right", "10mm"])
            .args(["--encoding", "utf-8", "--quiet"])
            .arg(&html_path)
            .arg(&pdf_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = match tokio::time::timeout(self.timeout, run).await {
            Err(_) => Err(ExportError::Timeout { secs: self.timeout.as_secs() }),
            Ok(Err(error)) => Err(ExportError::Io(error)),
            Ok(Ok(output)) if !output.status.success() => {
                Err(ExportError::Conversion(String::from_utf8_lossy(&output.stderr).trim().to_string()))
            }
            Ok(Ok(_)) => tokio::fs::read(&pdf_path).await.map_err(ExportError::Io),
        };

        let _ = tokio::fs::remove_file(&html_path).await;
        let _ = tokio::fs::remove_file(&pdf_path).await;
        result
    }
}
