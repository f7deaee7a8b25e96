//! Core data types shared by the tagging pipeline.

use std::collections::BTreeSet;
use std::fmt;

/// A set of tag strings: case-sensitive, deduplicated, ordered by codepoint.
pub type TagSet = BTreeSet<String>;

/// Where an attachment's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// File stored in the library; downloaded through the library API.
    Stored { file_url: String },
    /// Attachment that only links to a remote URL.
    Linked { url: String },
}

impl AttachmentSource {
    /// The URL to download from.
    pub fn url(&self) -> &str {
        match self {
            Self::Stored { file_url } => file_url,
            Self::Linked { url } => url,
        }
    }
}

/// A child attachment of a library item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub key: String,
    pub content_type: String,
    pub source: AttachmentSource,
}

impl Attachment {
    pub fn is_pdf(&self) -> bool {
        self.content_type.eq_ignore_ascii_case("application/pdf")
    }
}

/// Transient copy of one bibliographic entry, fetched fresh for each run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryItem {
    /// Library-assigned item key.
    pub key: String,
    /// Object version, sent back on write for optimistic concurrency.
    pub version: u64,
    pub title: String,
    pub item_type: String,
    pub abstract_note: Option<String>,
    pub tags: TagSet,
    pub attachments: Vec<Attachment>,
    pub url: Option<String>,
}

impl LibraryItem {
    /// The first PDF attachment, if any.
    pub fn first_pdf(&self) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.is_pdf())
    }

    /// Abstract text, treating whitespace-only as absent.
    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_note
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Link URL, treating whitespace-only as absent.
    pub fn link_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// One of the inputs that can feed a tag suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentSource {
    Title,
    Abstract,
    Pdf,
    Webpage,
}

impl ContentSource {
    /// Label used when rendering the section into a prompt.
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Abstract => "Abstract",
            Self::Pdf => "PDF content",
            Self::Webpage => "Webpage content",
        }
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Abstract => "abstract",
            Self::Pdf => "pdf",
            Self::Webpage => "webpage",
        };
        f.write_str(name)
    }
}

/// Text gathered for one item, in prompt order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    pub sections: Vec<(ContentSource, String)>,
}

impl ExtractedContent {
    pub fn push(&mut self, source: ContentSource, text: impl Into<String>) {
        self.sections.push((source, text.into()));
    }

    /// Sources that contributed, in order.
    pub fn sources(&self) -> Vec<ContentSource> {
        self.sections.iter().map(|(s, _)| *s).collect()
    }

    pub fn has(&self, source: ContentSource) -> bool {
        self.sections.iter().any(|(s, _)| *s == source)
    }

    /// Whether only the title is present.
    pub fn is_title_only(&self) -> bool {
        self.sections.iter().all(|(s, _)| *s == ContentSource::Title)
    }

    pub fn text_of(&self, source: ContentSource) -> Option<&str> {
        self.sections
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, t)| t.as_str())
    }

    /// Render as `Label: text` blocks separated by newlines.
    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|(source, text)| format!("{}: {text}", source.label()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Keep at most `max_words` whitespace-separated words, joined by single spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_uses_labels_in_order() {
        let mut content = ExtractedContent::default();
        content.push(ContentSource::Title, "On Tags");
        content.push(ContentSource::Abstract, "We study tags.");
        assert_eq!(content.render(), "Title: On Tags\nAbstract: We study tags.");
        assert_eq!(
            content.sources(),
            vec![ContentSource::Title, ContentSource::Abstract]
        );
        assert!(!content.is_title_only());
    }

    #[test]
    fn blank_abstract_and_url_are_absent() {
        let item = LibraryItem {
            abstract_note: Some("   ".into()),
            url: Some("".into()),
            ..Default::default()
        };
        assert!(item.abstract_text().is_none());
        assert!(item.link_url().is_none());
    }

    #[test]
    fn first_pdf_skips_other_attachments() {
        let item = LibraryItem {
            attachments: vec![
                Attachment {
                    key: "A".into(),
                    content_type: "text/html".into(),
                    source: AttachmentSource::Linked {
                        url: "https://example.org".into(),
                    },
                },
                Attachment {
                    key: "B".into(),
                    content_type: "application/pdf".into(),
                    source: AttachmentSource::Stored {
                        file_url: "https://api.example/items/B/file".into(),
                    },
                },
            ],
            ..Default::default()
        };
        assert_eq!(item.first_pdf().map(|a| a.key.as_str()), Some("B"));
    }

    #[test]
    fn truncate_words_normalizes_whitespace() {
        assert_eq!(truncate_words("a  b\n c d", 3), "a b c");
        assert_eq!(truncate_words("", 5), "");
    }
}
