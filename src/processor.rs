//! Per-item pipeline: extract → suggest → merge → write back → record tags.
//!
//! The merge is strictly add-only. The item's tag set sent back to the
//! library is always a superset of the set it had when fetched. Every error
//! here is recoverable and is reported in the returned [`ItemReport`].

use std::fmt;

use tracing::{error, info, warn};

use crate::config::ProcessingOptions;
use crate::extract::{self, ContentFetcher};
use crate::library::LibraryClient;
use crate::model::{ContentSource, LibraryItem, TagSet};
use crate::suggest::TagSuggester;
use crate::tags::TagStore;

/// How processing an item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// New tags were written to the library.
    Updated,
    /// Every suggested tag was already on the item.
    Unchanged,
    /// Nothing was sent to the suggester or the library.
    Skipped(String),
    /// Suggestion or write-back failed; the item was left untouched.
    Failed(String),
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated => f.write_str("updated"),
            Self::Unchanged => f.write_str("unchanged"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome of processing one item.
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub key: String,
    pub sources: Vec<ContentSource>,
    pub suggested: Vec<String>,
    /// Tags that were not on the item before.
    pub added: Vec<String>,
    pub status: ItemStatus,
}

impl ItemReport {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            sources: Vec::new(),
            suggested: Vec::new(),
            added: Vec::new(),
            status: ItemStatus::Unchanged,
        }
    }

    fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether processing got as far as a suggestion request.
    pub fn consulted_suggester(&self) -> bool {
        !matches!(self.status, ItemStatus::Skipped(_))
    }
}

/// Union `suggested` into `existing`. Returns the merged set and the tags that were new.
pub fn merge_tags(existing: &TagSet, suggested: &[String]) -> (TagSet, Vec<String>) {
    let mut merged = existing.clone();
    let mut added = Vec::new();
    for tag in suggested {
        if merged.insert(tag.clone()) {
            added.push(tag.clone());
        }
    }
    (merged, added)
}

/// Runs the tagging pipeline for single items.
pub struct ItemProcessor<'a> {
    library: &'a dyn LibraryClient,
    fetcher: &'a dyn ContentFetcher,
    suggester: &'a dyn TagSuggester,
    options: &'a ProcessingOptions,
}

impl<'a> ItemProcessor<'a> {
    pub fn new(
        library: &'a dyn LibraryClient,
        fetcher: &'a dyn ContentFetcher,
        suggester: &'a dyn TagSuggester,
        options: &'a ProcessingOptions,
    ) -> Self {
        Self {
            library,
            fetcher,
            suggester,
            options,
        }
    }

    /// Tag one item, recording new tags in `store`.
    pub fn process(&self, store: &mut TagStore, item: &LibraryItem) -> ItemReport {
        let report = ItemReport::new(&item.key);

        let Some(content) = extract::extract(item, self.options, self.fetcher) else {
            warn!(item = %item.key, "no abstract, PDF text or page text; skipping");
            return report.with_status(ItemStatus::Skipped("no content".into()));
        };
        let mut report = ItemReport {
            sources: content.sources(),
            ..report
        };
        info!(item = %item.key, sources = ?report.sources, "content sources");

        let known = store.snapshot();
        let suggested = match self.suggester.suggest(&content, &known) {
            Ok(tags) => tags,
            Err(e) => {
                error!(item = %item.key, error = %e, "tag suggestion failed");
                return report.with_status(ItemStatus::Failed(e.to_string()));
            }
        };
        info!(item = %item.key, suggested = ?suggested, existing = ?item.tags, "suggested tags");
        report.suggested = suggested;

        let (merged, added) = merge_tags(&item.tags, &report.suggested);
        for tag in &added {
            if store.contains(tag) {
                continue;
            }
            match store.add(tag) {
                Ok(_) => info!(tag = %tag, "new tag recorded"),
                Err(e) => error!(tag = %tag, error = %e, "failed to save tags file"),
            }
        }

        if added.is_empty() {
            info!(item = %item.key, "all suggested tags already present");
            return report.with_status(ItemStatus::Unchanged);
        }

        match self.library.update_tags(item, &merged) {
            Ok(()) => {
                info!(item = %item.key, added = ?added, "tags updated");
                report.added = added;
                report.with_status(ItemStatus::Updated)
            }
            Err(e) => {
                error!(item = %item.key, error = %e, "failed to update item tags");
                report.with_status(ItemStatus::Failed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &[&str]) -> TagSet {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn merge_is_add_only() {
        let existing = set(&["AI", "Security"]);
        let (merged, added) = merge_tags(&existing, &["Biosecurity".into(), "Security".into()]);
        assert_eq!(merged, set(&["AI", "Biosecurity", "Security"]));
        assert_eq!(added, vec!["Biosecurity"]);
        assert!(existing.is_subset(&merged));
    }

    #[test]
    fn merge_deduplicates_suggestions() {
        let (merged, added) = merge_tags(&TagSet::new(), &["X".into(), "X".into()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(added, vec!["X"]);
    }

    #[test]
    fn merge_is_case_sensitive() {
        let (merged, added) = merge_tags(&set(&["llm"]), &["LLM".into()]);
        assert_eq!(merged, set(&["LLM", "llm"]));
        assert_eq!(added, vec!["LLM"]);
    }

    #[test]
    fn status_display() {
        assert_eq!(ItemStatus::Updated.to_string(), "updated");
        assert_eq!(
            ItemStatus::Skipped("no content".into()).to_string(),
            "skipped: no content"
        );
    }
}
