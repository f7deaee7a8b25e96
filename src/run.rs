//! Run controller: walk the library and tag one item at a time.

use std::thread;

use tracing::{info, warn};

use crate::config::ProcessingOptions;
use crate::library::{LibraryClient, LibraryResult};
use crate::processor::{ItemProcessor, ItemReport, ItemStatus};
use crate::tags::TagStore;

/// Counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, report: &ItemReport) {
        self.processed += 1;
        match report.status {
            ItemStatus::Updated => self.updated += 1,
            ItemStatus::Unchanged => self.unchanged += 1,
            ItemStatus::Skipped(_) => self.skipped += 1,
            ItemStatus::Failed(_) => self.failed += 1,
        }
    }
}

/// Sequential loop over the library's top-level items.
pub struct RunController<'a> {
    library: &'a dyn LibraryClient,
    processor: ItemProcessor<'a>,
    options: &'a ProcessingOptions,
}

impl<'a> RunController<'a> {
    pub fn new(
        library: &'a dyn LibraryClient,
        processor: ItemProcessor<'a>,
        options: &'a ProcessingOptions,
    ) -> Self {
        Self {
            library,
            processor,
            options,
        }
    }

    /// Process items in service order, stopping at the configured limit.
    ///
    /// Only a failure to list the library is returned as an error; per-item
    /// failures are logged and counted.
    pub fn run(&self, store: &mut TagStore) -> LibraryResult<RunSummary> {
        let mut items = self.library.top_items(self.options.limit)?;
        if let Some(limit) = self.options.limit {
            items.truncate(limit);
        }
        let total = items.len();
        info!(total, "fetched library items");

        let mut summary = RunSummary::default();
        for (i, mut item) in items.into_iter().enumerate() {
            info!(
                item = %item.key,
                item_type = %item.item_type,
                "processing item {}/{}: {}",
                i + 1,
                total,
                item.title
            );

            if self.options.parse_pdf {
                match self.library.attachments(&item.key) {
                    Ok(attachments) => item.attachments = attachments,
                    Err(e) => warn!(item = %item.key, error = %e, "failed to list attachments"),
                }
            }

            let report = self.processor.process(store, &item);
            info!(item = %report.key, status = %report.status, "item done");
            summary.record(&report);

            // Pacing only matters after a model request.
            if i + 1 < total && report.consulted_suggester() && !self.options.delay.is_zero() {
                thread::sleep(self.options.delay);
            }
        }

        info!(
            processed = summary.processed,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            failed = summary.failed,
            known_tags = store.len(),
            "run complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: ItemStatus) -> ItemReport {
        ItemReport {
            key: "K".into(),
            sources: Vec::new(),
            suggested: Vec::new(),
            added: Vec::new(),
            status,
        }
    }

    #[test]
    fn summary_counts_statuses() {
        let mut summary = RunSummary::default();
        summary.record(&report(ItemStatus::Updated));
        summary.record(&report(ItemStatus::Unchanged));
        summary.record(&report(ItemStatus::Skipped("x".into())));
        summary.record(&report(ItemStatus::Failed("y".into())));
        summary.record(&report(ItemStatus::Updated));
        assert_eq!(
            summary,
            RunSummary {
                processed: 5,
                updated: 2,
                unchanged: 1,
                skipped: 1,
                failed: 1,
            }
        );
    }

    #[test]
    fn skipped_items_never_reach_the_suggester() {
        assert!(!report(ItemStatus::Skipped("no content".into())).consulted_suggester());
        assert!(report(ItemStatus::Failed("429".into())).consulted_suggester());
        assert!(report(ItemStatus::Unchanged).consulted_suggester());
    }
}
