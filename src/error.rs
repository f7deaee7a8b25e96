//! Rich diagnostic error types for zotero-tagger.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Only configuration errors and a failure
//! to list the library end a run; the rest are logged per item.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::extract::ExtractionError;
use crate::library::LibraryError;
use crate::logging::LoggingError;
use crate::suggest::SuggestError;
use crate::tags::TagStoreError;

/// Top-level error type.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum TaggerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Suggest(#[from] SuggestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    TagStore(#[from] TagStoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Logging(#[from] LoggingError),
}

pub type TaggerResult<T> = std::result::Result<T, TaggerError>;
