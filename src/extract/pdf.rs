//! PDF text extraction using the `pdf-extract` crate.
//!
//! `pdf-extract` returns every page as one string with form feeds between
//! pages. Only the leading pages are kept, since the abstract, introduction
//! and keywords of a paper are what tagging needs.

use crate::extract::{ExtractResult, ExtractionError, MAX_WORDS};
use crate::model::truncate_words;

/// Pages kept from the start of the document.
pub const MAX_PAGES: usize = 5;

/// Extract up to [`MAX_PAGES`] pages and [`MAX_WORDS`] words of text.
pub fn extract_pdf_text(data: &[u8]) -> ExtractResult<String> {
    let text = pdf_extract::extract_text_from_mem(data).map_err(|e| ExtractionError::Parse {
        format: "pdf".into(),
        message: e.to_string(),
    })?;
    leading_pages(&text)
}

/// Keep the first pages of already-extracted text and cap the word count.
pub fn leading_pages(text: &str) -> ExtractResult<String> {
    let pages = text
        .split('\x0C')
        .take(MAX_PAGES)
        .collect::<Vec<_>>()
        .join("\n");

    let words = truncate_words(&pages, MAX_WORDS);
    if words.is_empty() {
        return Err(ExtractionError::Empty {
            origin: "(pdf)".into(),
        });
    }
    Ok(words)
}
