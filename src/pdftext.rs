//! PDF text extraction via the external `pdftotext` utility.

use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PdfTextError {
    #[error("pdftotext is not installed or not on PATH")]
    Unavailable,
    #[error("text extraction failed: {0}")]
    Failed(String),
}

/// Extract plain text from a PDF by running `pdftotext <path> -`.
///
/// Malformed PDFs surface as [`PdfTextError::Failed`], never as a panic.
pub async fn extract_text(path: &Path) -> Result<String, PdfTextError> {
    run_pdftotext("pdftotext", path).await
}

async fn run_pdftotext(program: &str, path: &Path) -> Result<String, PdfTextError> {
    debug!("Running {} on {:?}", program, path);

    let output = Command::new(program)
        .arg(path)
        .arg("-")
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => PdfTextError::Unavailable,
            _ => PdfTextError::Failed(e.to_string()),
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        let detail = if stderr.trim().is_empty() {
            format!("pdftotext exited with {}", output.status)
        } else {
            stderr.trim().to_string()
        };
        return Err(PdfTextError::Failed(detail));
    }

    // pdftotext reports recoverable problems (e.g. "Syntax Error") on stderr
    // while still exiting 0; treat them as fatal only when nothing came out.
    let text = String::from_utf8_lossy(&output.stdout).to_string();
    if text.trim().is_empty() {
        let detail = if stderr.trim().is_empty() {
            "pdftotext produced no output".to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(PdfTextError::Failed(detail));
    }

    if !stderr.trim().is_empty() {
        warn!("pdftotext reported warnings for {:?}: {}", path, stderr.trim());
    }

    debug!("Extracted {} chars from {:?}", text.len(), path);
    Ok(text)
}
