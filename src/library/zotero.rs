//! Zotero Web API v3 client over blocking `ureq`.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::library::error::{LibraryError, LibraryResult};
use crate::library::LibraryClient;
use crate::model::{Attachment, AttachmentSource, LibraryItem, TagSet};

/// Largest page the API serves.
const PAGE_SIZE: usize = 100;

const API_VERSION: &str = "3";

/// Client for one user or group library.
pub struct ZoteroClient {
    agent: ureq::Agent,
    /// `{base}/{users|groups}/{id}`
    library_url: String,
    api_key: String,
}

impl ZoteroClient {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            library_url: format!(
                "{}/{}/{}",
                config.zotero_api_base,
                config.library_type.path_segment(),
                config.library_id
            ),
            api_key: config.zotero_api_key.clone(),
        }
    }

    fn get(&self, url: &str) -> LibraryResult<ureq::Response> {
        self.agent
            .get(url)
            .set("Zotero-API-Key", &self.api_key)
            .set("Zotero-API-Version", API_VERSION)
            .call()
            .map_err(|e| map_ureq_error(url, e))
    }

    fn decode<T: for<'de> Deserialize<'de>>(url: &str, resp: ureq::Response) -> LibraryResult<T> {
        resp.into_json().map_err(|e| LibraryError::Decode {
            url: url.into(),
            message: e.to_string(),
        })
    }
}

/// Rows to ask for next. Zero once `limit` is reached, even if the service
/// returned more rows than requested.
fn page_request_size(limit: Option<usize>, fetched: usize) -> usize {
    match limit {
        Some(limit) => PAGE_SIZE.min(limit.saturating_sub(fetched)),
        None => PAGE_SIZE,
    }
}

impl LibraryClient for ZoteroClient {
    fn top_items(&self, limit: Option<usize>) -> LibraryResult<Vec<LibraryItem>> {
        let mut items = Vec::new();
        let mut start = 0usize;

        loop {
            let want = page_request_size(limit, items.len());
            if want == 0 {
                break;
            }

            let url = format!(
                "{}/items/top?format=json&start={start}&limit={want}",
                self.library_url
            );
            let resp = self.get(&url)?;
            let total: Option<usize> = resp
                .header("Total-Results")
                .and_then(|v| v.trim().parse().ok());
            let page: Vec<ApiItem> = Self::decode(&url, resp)?;
            let got = page.len();
            debug!(start, got, total = ?total, "fetched item page");

            items.extend(page.into_iter().map(ApiItem::into_item));
            start += got;

            let exhausted = got < want || total.is_some_and(|t| start >= t);
            if got == 0 || exhausted {
                break;
            }
        }

        Ok(items)
    }

    fn attachments(&self, item_key: &str) -> LibraryResult<Vec<Attachment>> {
        let url = format!("{}/items/{item_key}/children?format=json", self.library_url);
        let resp = self.get(&url)?;
        let children: Vec<ApiItem> = Self::decode(&url, resp)?;
        Ok(children
            .into_iter()
            .filter_map(|c| c.into_attachment(&self.library_url))
            .collect())
    }

    fn update_tags(&self, item: &LibraryItem, tags: &TagSet) -> LibraryResult<()> {
        let url = format!("{}/items/{}", self.library_url, item.key);
        let body = serde_json::json!({
            "tags": tags
                .iter()
                .map(|t| serde_json::json!({ "tag": t }))
                .collect::<Vec<_>>(),
        });

        let result = self
            .agent
            .request("PATCH", &url)
            .set("Zotero-API-Key", &self.api_key)
            .set("Zotero-API-Version", API_VERSION)
            .set("If-Unmodified-Since-Version", &item.version.to_string())
            .send_json(body);

        match result {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(412, _)) => Err(LibraryError::VersionConflict {
                key: item.key.clone(),
            }),
            Err(e) => Err(map_ureq_error(&url, e)),
        }
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> LibraryError {
    match err {
        ureq::Error::Status(status, resp) => LibraryError::Status {
            url: url.into(),
            status,
            body: resp.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => LibraryError::Request {
            url: url.into(),
            message: transport.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiItem {
    key: String,
    #[serde(default)]
    version: u64,
    data: ApiItemData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiItemData {
    item_type: String,
    title: String,
    abstract_note: String,
    url: String,
    tags: Vec<ApiTag>,
    link_mode: String,
    content_type: String,
}

#[derive(Debug, Deserialize)]
struct ApiTag {
    tag: String,
}

impl ApiItem {
    fn into_item(self) -> LibraryItem {
        let data = self.data;
        LibraryItem {
            key: self.key,
            version: self.version,
            title: data.title,
            item_type: data.item_type,
            abstract_note: Some(data.abstract_note).filter(|a| !a.trim().is_empty()),
            tags: data.tags.into_iter().map(|t| t.tag).collect(),
            attachments: Vec::new(),
            url: Some(data.url).filter(|u| !u.trim().is_empty()),
        }
    }

    /// Attachments whose bytes we can reach over HTTP. Linked local files are dropped.
    fn into_attachment(self, library_url: &str) -> Option<Attachment> {
        let data = self.data;
        if data.item_type != "attachment" {
            return None;
        }
        let source = match data.link_mode.as_str() {
            "imported_file" | "imported_url" => AttachmentSource::Stored {
                file_url: format!("{library_url}/items/{}/file", self.key),
            },
            "linked_url" if !data.url.is_empty() => AttachmentSource::Linked { url: data.url },
            _ => return None,
        };
        Some(Attachment {
            key: self.key,
            content_type: data.content_type,
            source,
        })
    }
}
