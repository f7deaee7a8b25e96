// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # zotero-tagger
//!
//! Tags reference-library items with language-model suggestions.
//!
//! ## Pipeline
//!
//! For each top-level item, in the order the library returns them:
//!
//! 1. **Extract** (`extract`): abstract, optionally PDF text and linked page text
//! 2. **Suggest** (`suggest`): one completion call with the text and the known tags
//! 3. **Merge** (`processor`): add-only union with the item's tags
//! 4. **Write back** (`library`): one update call per changed item
//! 5. **Record** (`tags`): new tags go to the master tag file immediately
//!
//! Everything runs on one thread with blocking I/O. The external services sit
//! behind small traits (`LibraryClient`, `ContentFetcher`, `TagSuggester`) so
//! the pipeline can be driven by fakes.
//!
//! ## Library usage
//!
//! ```no_run
//! use zotero_tagger::config::{Config, ProcessingOptions};
//! use zotero_tagger::extract::HttpFetcher;
//! use zotero_tagger::library::ZoteroClient;
//! use zotero_tagger::processor::ItemProcessor;
//! use zotero_tagger::run::RunController;
//! use zotero_tagger::suggest::{AnthropicClient, LlmSuggester};
//! use zotero_tagger::tags::TagStore;
//!
//! let config = Config::from_env().unwrap();
//! let options = ProcessingOptions::default();
//! let library = ZoteroClient::new(&config);
//! let fetcher = HttpFetcher::new(config.zotero_api_key.clone());
//! let suggester = LlmSuggester::new(AnthropicClient::from_config(&config));
//! let mut store = TagStore::in_memory();
//!
//! let processor = ItemProcessor::new(&library, &fetcher, &suggester, &options);
//! let summary = RunController::new(&library, processor, &options)
//!     .run(&mut store)
//!     .unwrap();
//! println!("updated {} items", summary.updated);
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod library;
pub mod logging;
pub mod model;
pub mod processor;
pub mod run;
pub mod suggest;
pub mod tags;

pub use error::{TaggerError, TaggerResult};
