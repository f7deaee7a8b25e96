//! Master tag list backed by a plain-text file.
//!
//! The file holds one tag per line, sorted by codepoint. Every new tag is
//! flushed immediately with a write-temp-then-rename, so the file on disk is
//! always a complete snapshot of the in-memory set.

use std::io::Write;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::model::TagSet;

/// Errors from flushing the tag file.
#[derive(Debug, Error, Diagnostic)]
pub enum TagStoreError {
    #[error("failed to write tags file {path}")]
    #[diagnostic(
        code(tagger::tags::persist),
        help(
            "The tag file could not be rewritten. Check that its directory exists \
             and is writable. The previous file contents are left untouched."
        )
    )]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type TagStoreResult<T> = std::result::Result<T, TagStoreError>;

/// Deduplicated set of every tag the tool knows about.
#[derive(Debug, Default)]
pub struct TagStore {
    path: Option<PathBuf>,
    tags: TagSet,
}

impl TagStore {
    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load tags from `path`. A missing file starts an empty set.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let tags = match std::fs::read_to_string(path) {
            Ok(data) => parse_tags_file(&data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TagSet::new(),
            Err(e) => {
                return Err(ConfigError::TagsFileUnreadable {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        info!(count = tags.len(), path = %path.display(), "loaded tags");
        Ok(Self {
            path: Some(path.to_path_buf()),
            tags,
        })
    }

    /// Case-sensitive exact lookup.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Insert `tag` and persist. Returns whether it was new.
    ///
    /// The tag stays in memory even if persisting fails.
    pub fn add(&mut self, tag: &str) -> TagStoreResult<bool> {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.contains(tag) {
            return Ok(false);
        }
        self.tags.insert(tag.to_string());
        self.persist()?;
        Ok(true)
    }

    /// Rewrite the backing file with the full set. No-op for in-memory stores.
    pub fn persist(&self) -> TagStoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let err = |source| TagStoreError::Persist {
            path: path.display().to_string(),
            source,
        };

        let mut body = String::new();
        for tag in &self.tags {
            body.push_str(tag);
            body.push('\n');
        }

        let tmp = tmp_path(path);
        let mut file = std::fs::File::create(&tmp).map_err(err)?;
        file.write_all(body.as_bytes()).map_err(err)?;
        file.sync_all().map_err(err)?;
        drop(file);
        std::fs::rename(&tmp, path).map_err(err)?;

        debug!(count = self.tags.len(), path = %path.display(), "saved tags");
        Ok(())
    }

    /// Sorted snapshot, suitable for embedding in a prompt.
    pub fn snapshot(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Parse the tag file format: one tag per line, blank lines ignored.
pub fn parse_tags_file(data: &str) -> TagSet {
    data.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Sibling temp file in the same directory, so the rename stays on one filesystem.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
