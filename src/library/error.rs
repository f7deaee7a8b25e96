//! Rich diagnostic error types for the library API client.

use miette::Diagnostic;
use thiserror::Error;

/// Errors from talking to the reference library service.
#[derive(Debug, Error, Diagnostic)]
pub enum LibraryError {
    #[error("library request to {url} failed: {message}")]
    #[diagnostic(
        code(tagger::library::request),
        help("Check that the library API is reachable and the network is available.")
    )]
    Request { url: String, message: String },

    #[error("library API returned status {status} for {url}")]
    #[diagnostic(
        code(tagger::library::status),
        help(
            "A 403 usually means the API key lacks access to this library. \
             Check ZOTERO_API_KEY, ZOTERO_LIBRARY_ID and ZOTERO_LIBRARY_TYPE."
        )
    )]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("item \"{key}\" changed remotely since it was fetched")]
    #[diagnostic(
        code(tagger::library::version_conflict),
        help("The item was edited while the run was in progress. Run again to pick up the new version.")
    )]
    VersionConflict { key: String },

    #[error("unexpected response from {url}: {message}")]
    #[diagnostic(
        code(tagger::library::decode),
        help("The library API returned a body that could not be decoded.")
    )]
    Decode { url: String, message: String },
}

/// Convenience alias for library operation results.
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
