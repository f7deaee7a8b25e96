//! Content extraction: pick the text an item's tags are suggested from.
//!
//! Sources, in prompt order:
//! - title (context only, never enough on its own unless `title_only` is set)
//! - abstract, always included when present
//! - first PDF attachment, when `parse_pdf` is set
//! - the item's link URL, according to [`UrlMode`]
//!
//! Fetching and parsing sit behind [`ContentFetcher`]. Failures there are
//! logged and the item continues with whatever text was obtained.

pub mod html;
pub mod http;
pub mod pdf;

pub use http::HttpFetcher;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ProcessingOptions, UrlMode};
use crate::model::{Attachment, ContentSource, ExtractedContent, LibraryItem};

/// Word cap applied to PDF and web page text.
pub const MAX_WORDS: usize = 2000;

/// Recoverable errors from downloading or parsing a content source.
#[derive(Debug, Error, Diagnostic)]
pub enum ExtractionError {
    #[error("fetch error for URL \"{url}\": {message}")]
    #[diagnostic(
        code(tagger::extract::fetch),
        help("The URL could not be downloaded. The item continues with its other sources.")
    )]
    Fetch { url: String, message: String },

    #[error("parse error in {format} content: {message}")]
    #[diagnostic(
        code(tagger::extract::parse),
        help("The downloaded bytes are not valid {format}, or the document is corrupted.")
    )]
    Parse { format: String, message: String },

    #[error("no text extracted from \"{origin}\"")]
    #[diagnostic(
        code(tagger::extract::empty),
        help("The source contains no text, for example a scanned PDF without a text layer.")
    )]
    Empty { origin: String },
}

pub type ExtractResult<T> = std::result::Result<T, ExtractionError>;

/// Downloads and parses the remote content sources.
pub trait ContentFetcher {
    /// Text of a PDF attachment.
    fn pdf_text(&self, attachment: &Attachment) -> ExtractResult<String>;

    /// Main text of the web page at `url`.
    fn page_text(&self, url: &str) -> ExtractResult<String>;
}

/// Gather the content for `item`. Returns `None` when there is nothing to
/// suggest tags from.
pub fn extract(
    item: &LibraryItem,
    options: &ProcessingOptions,
    fetcher: &dyn ContentFetcher,
) -> Option<ExtractedContent> {
    let mut content = ExtractedContent::default();

    let title = item.title.trim();
    if !title.is_empty() {
        content.push(ContentSource::Title, title);
    }

    if let Some(abstract_text) = item.abstract_text() {
        content.push(ContentSource::Abstract, abstract_text);
    }

    if options.parse_pdf {
        if let Some(attachment) = item.first_pdf() {
            match fetcher.pdf_text(attachment) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(item = %item.key, attachment = %attachment.key, "extracted pdf text");
                    content.push(ContentSource::Pdf, text);
                }
                Ok(_) => {
                    warn!(item = %item.key, attachment = %attachment.key, "pdf attachment has no text");
                }
                Err(e) => {
                    warn!(item = %item.key, attachment = %attachment.key, error = %e, "pdf extraction failed");
                }
            }
        }
    }

    if let Some(url) = item.link_url() {
        let fetch = match options.url_mode {
            UrlMode::Never => false,
            UrlMode::Fallback => !content.has(ContentSource::Pdf),
            UrlMode::Always => true,
        };
        if fetch {
            match fetcher.page_text(url) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(item = %item.key, url, "extracted page text");
                    content.push(ContentSource::Webpage, text);
                }
                Ok(_) => warn!(item = %item.key, url, "web page has no text"),
                Err(e) => warn!(item = %item.key, url, error = %e, "web page extraction failed"),
            }
        }
    }

    if content.sections.is_empty() {
        return None;
    }
    if content.is_title_only() && !options.title_only {
        return None;
    }
    Some(content)
}
