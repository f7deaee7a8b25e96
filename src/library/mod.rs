//! Reference library service.
//!
//! The pipeline only needs three operations from the library: list the
//! top-level items, list an item's attachments, and replace an item's tag
//! list. `LibraryClient` captures exactly that, so the processing code never
//! sees HTTP and tests can substitute an in-memory fake.

pub mod error;
pub mod zotero;

pub use error::{LibraryError, LibraryResult};
pub use zotero::ZoteroClient;

use crate::model::{Attachment, LibraryItem, TagSet};

/// Narrow contract over the reference library API.
pub trait LibraryClient {
    /// Top-level items in the order the service returns them, at most `limit`.
    ///
    /// Attachments are not populated; see [`LibraryClient::attachments`].
    fn top_items(&self, limit: Option<usize>) -> LibraryResult<Vec<LibraryItem>>;

    /// Child attachments of the item with `item_key`.
    fn attachments(&self, item_key: &str) -> LibraryResult<Vec<Attachment>>;

    /// Replace the item's tags with `tags` in a single update call.
    ///
    /// Callers pass a superset of the item's current tags.
    fn update_tags(&self, item: &LibraryItem, tags: &TagSet) -> LibraryResult<()>;
}
