//! PDF text extraction with a leading-page cap.
//!
//! Extraction is pipeline-layer: callers pass a path and a page cap, this
//! module returns plain UTF-8 text for the first pages. Failures never
//! propagate out of [`extract_text`]; they are logged and collapse to an
//! empty string.

use std::panic::AssertUnwindSafe;
use std::path::Path;

use pdf_extract::{Document, OutputError, PlainTextOutput};
use tracing::{error, info};

use crate::models::SourceDocument;

/// Extraction error. The pipeline logs it and skips the file.
#[derive(Debug)]
pub enum ExtractError {
    Io(std::io::Error),
    Pdf(String),
    Panicked(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Io(e) => write!(f, "failed to read file: {}", e),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Panicked(e) => write!(f, "PDF extractor panicked: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        ExtractError::Io(e)
    }
}

/// Parses a PDF, decrypting it with the empty password if needed.
pub fn load_pdf(bytes: &[u8]) -> Result<Document, ExtractError> {
    let mut doc =
        guarded(|| Document::load_mem(bytes))?.map_err(|e| ExtractError::Pdf(e.to_string()))?;
    if doc.is_encrypted() {
        doc.decrypt("")
            .map_err(|e| ExtractError::Pdf(format!("encrypted document: {}", e)))?;
    }
    Ok(doc)
}

pub fn page_count(doc: &Document) -> usize {
    doc.get_pages().len()
}

/// Text of one page; `page_num` starts at 1.
pub fn page_text(doc: &Document, page_num: u32) -> Result<String, ExtractError> {
    guarded(|| -> Result<String, OutputError> {
        let mut text = String::new();
        {
            let mut output = PlainTextOutput::new(&mut text);
            pdf_extract::output_doc_page(doc, &mut output, page_num)?;
        }
        Ok(text)
    })?
    .map_err(|e| ExtractError::Pdf(format!("page {}: {}", page_num, e)))
}

/// Text of the first `min(max_pages, page_count)` pages. Later pages are
/// never parsed.
pub fn extract_pages(doc: &Document, max_pages: i64) -> Result<Vec<String>, ExtractError> {
    let take = page_budget(max_pages).min(page_count(doc));
    (1..=take as u32).map(|n| page_text(doc, n)).collect()
}

// pdf-extract panics on some malformed inputs instead of returning an error.
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, ExtractError> {
    std::panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| ExtractError::Panicked(panic_message(&payload)))
}

fn page_budget(max_pages: i64) -> usize {
    if max_pages <= 0 {
        0
    } else {
        usize::try_from(max_pages).unwrap_or(usize::MAX)
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Concatenates the first `min(max_pages, pages.len())` pages with no separator.
///
/// A cap of zero or less selects no pages.
pub fn leading_pages(pages: &[String], max_pages: i64) -> String {
    pages[..page_budget(max_pages).min(pages.len())].concat()
}

/// Reads a PDF and returns a [`SourceDocument`] holding the capped text.
pub fn extract_document(path: &Path, max_pages: i64) -> Result<SourceDocument, ExtractError> {
    let mut doc = SourceDocument::discovered(path, max_pages);
    if max_pages <= 0 {
        return Ok(doc);
    }

    let bytes = std::fs::read(path)?;
    let pdf = load_pdf(&bytes)?;
    let total_pages = page_count(&pdf);
    let pages = extract_pages(&pdf, max_pages)?;

    doc.text = leading_pages(&pages, max_pages);
    doc.pages_read = pages.len();

    info!(
        "Extracted {} of {} pages from {}",
        doc.pages_read,
        total_pages,
        path.display()
    );
    Ok(doc)
}

/// Like [`extract_document`], but logs failures and returns an empty document.
///
/// The second element is `false` when extraction failed.
pub fn extract_or_empty(path: &Path, max_pages: i64) -> (SourceDocument, bool) {
    match extract_document(path, max_pages) {
        Ok(doc) => (doc, true),
        Err(e) => {
            error!("Error extracting text from {}: {}", path.display(), e);
            (SourceDocument::discovered(path, max_pages), false)
        }
    }
}

/// Returns the text of the first `max_pages` pages, or `""` on any failure.
pub fn extract_text(path: &Path, max_pages: i64) -> String {
    extract_or_empty(path, max_pages).0.text
}
