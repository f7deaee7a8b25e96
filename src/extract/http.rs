//! Blocking HTTP fetcher for PDF attachments and linked web pages.

use std::io::Read;
use std::time::Duration;

use crate::extract::{ContentFetcher, ExtractResult, ExtractionError, html, pdf};
use crate::model::{Attachment, AttachmentSource};

/// Maximum PDF download size (50 MB).
const MAX_PDF_BYTES: u64 = 50 * 1024 * 1024;

const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
const PDF_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Fetches remote content with `ureq`.
///
/// Stored attachments are downloaded through the library API and need its key.
pub struct HttpFetcher {
    agent: ureq::Agent,
    library_api_key: String,
}

impl HttpFetcher {
    pub fn new(library_api_key: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
            library_api_key: library_api_key.into(),
        }
    }

    fn download_pdf(&self, attachment: &Attachment) -> ExtractResult<Vec<u8>> {
        let url = attachment.source.url();
        let mut request = self.agent.get(url).timeout(PDF_TIMEOUT);
        if let AttachmentSource::Stored { .. } = attachment.source {
            request = request.set("Zotero-API-Key", &self.library_api_key);
        }

        let response = request.call().map_err(|e| fetch_error(url, e))?;
        let mut data = Vec::new();
        response
            .into_reader()
            .take(MAX_PDF_BYTES)
            .read_to_end(&mut data)
            .map_err(|e| ExtractionError::Fetch {
                url: url.into(),
                message: e.to_string(),
            })?;
        Ok(data)
    }
}

impl ContentFetcher for HttpFetcher {
    fn pdf_text(&self, attachment: &Attachment) -> ExtractResult<String> {
        let data = self.download_pdf(attachment)?;
        pdf::extract_pdf_text(&data).map_err(|e| match e {
            ExtractionError::Empty { .. } => ExtractionError::Empty {
                origin: attachment.source.url().into(),
            },
            other => other,
        })
    }

    fn page_text(&self, url: &str) -> ExtractResult<String> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ExtractionError::Fetch {
                url: url.into(),
                message: "not an http(s) URL".into(),
            });
        }

        let response = self
            .agent
            .get(url)
            .timeout(PAGE_TIMEOUT)
            .call()
            .map_err(|e| fetch_error(url, e))?;
        let body = response.into_string().map_err(|e| ExtractionError::Fetch {
            url: url.into(),
            message: e.to_string(),
        })?;

        let text = html::main_text(&body);
        if text.is_empty() {
            return Err(ExtractionError::Empty { origin: url.into() });
        }
        Ok(text)
    }
}

fn fetch_error(url: &str, err: ureq::Error) -> ExtractionError {
    let message = match err {
        ureq::Error::Status(code, _) => format!("HTTP error {code}"),
        ureq::Error::Transport(transport) => transport.to_string(),
    };
    ExtractionError::Fetch {
        url: url.into(),
        message,
    }
}
