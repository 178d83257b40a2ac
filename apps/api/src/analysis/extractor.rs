//! Document Extractor — turns an uploaded PDF into plain text or a definitive failure.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::analysis::models::{ExtractedText, ResumeDocument};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    /// Corrupt, encrypted, or otherwise structurally unreadable document.
    #[error("unreadable document: {0}")]
    Unreadable(String),

    /// The document opened but no page produced any text (e.g. scanned images only).
    #[error("no extractable text")]
    NoText,
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, document: ResumeDocument) -> Result<ExtractedText, ExtractionFailure>;
}

/// `pdf-extract` backed extractor.
///
/// Decoding runs on the blocking pool. A panic inside the decoder surfaces as a join error
/// and is reported as `Unreadable`, so a malformed upload can never take the worker down.
pub struct PdfExtractor;

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(&self, document: ResumeDocument) -> Result<ExtractedText, ExtractionFailure> {
        info!(
            "Processing PDF file: {} ({} bytes)",
            document.filename,
            document.bytes.len()
        );

        let bytes = document.bytes.clone();
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| e.to_string())
        })
        .await;

        let pages = match pages {
            Ok(Ok(pages)) => pages,
            Ok(Err(reason)) => {
                error!("Error processing PDF {}: {reason}", document.filename);
                return Err(ExtractionFailure::Unreadable(reason));
            }
            Err(join_err) => {
                error!("PDF decoder aborted on {}: {join_err}", document.filename);
                return Err(ExtractionFailure::Unreadable(
                    "PDF decoder aborted".to_string(),
                ));
            }
        };

        let page_count = pages.len();
        let text = join_pages(pages).inspect_err(|_| {
            warn!("Extracted text is empty for {}", document.filename);
        })?;

        info!(
            "Successfully extracted text from PDF with {} pages ({} chars)",
            page_count,
            text.as_str().chars().count()
        );
        Ok(text)
    }
}

/// Concatenates page texts in order with no delimiter. Pages without text contribute the
/// empty string; only an all-blank result is a failure.
pub fn join_pages<I>(pages: I) -> Result<ExtractedText, ExtractionFailure>
where
    I: IntoIterator<Item = String>,
{
    let text: String = pages.into_iter().collect();
    ExtractedText::new(text).ok_or(ExtractionFailure::NoText)
}
