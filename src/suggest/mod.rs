//! Tag suggestion via a language model.
//!
//! [`LlmSuggester`] builds one prompt per item from its extracted content and
//! the known-tag list, sends it through a [`CompletionClient`], and parses
//! the reply into a flat list of tags. Listing the known tags in the prompt
//! biases the model toward reusing them instead of inventing synonyms.

pub mod anthropic;

pub use anthropic::{AnthropicClient, AnthropicConfig};

use std::sync::LazyLock;

use miette::Diagnostic;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::model::{ContentSource, ExtractedContent};

/// Errors from the suggestion step. Both skip the item.
#[derive(Debug, Error, Diagnostic)]
pub enum SuggestError {
    #[error("language model request failed: {message}")]
    #[diagnostic(
        code(tagger::suggest::api),
        help(
            "Check ANTHROPIC_API_KEY and network access. Rate-limit errors clear up \
             after a pause; the item is left untouched and can be retried on the next run."
        )
    )]
    Api { message: String },

    #[error("could not parse tags from model response: {message}")]
    #[diagnostic(
        code(tagger::suggest::parse),
        help("The model returned no recognizable tag lines.")
    )]
    Parse { message: String },
}

pub type SuggestResult<T> = std::result::Result<T, SuggestError>;

/// A single-turn completion service.
pub trait CompletionClient {
    fn complete(&self, system: &str, prompt: &str) -> SuggestResult<String>;
}

/// Produces candidate tags for one item's content.
pub trait TagSuggester {
    fn suggest(
        &self,
        content: &ExtractedContent,
        known_tags: &[String],
    ) -> SuggestResult<Vec<String>>;
}

pub const SYSTEM_PROMPT: &str = "You are a helpful academic librarian who creates consistent, \
    descriptive tags for academic papers, reports, and blog posts.";

/// Suggester backed by any [`CompletionClient`].
pub struct LlmSuggester<C> {
    client: C,
}

impl<C: CompletionClient> LlmSuggester<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: CompletionClient> TagSuggester for LlmSuggester<C> {
    fn suggest(
        &self,
        content: &ExtractedContent,
        known_tags: &[String],
    ) -> SuggestResult<Vec<String>> {
        let prompt = build_prompt(content, known_tags);
        let response = self.client.complete(SYSTEM_PROMPT, &prompt)?;
        debug!(response = %response.trim(), "model response");
        parse_tags(&response)
    }
}

/// Render the user prompt for one item.
pub fn build_prompt(content: &ExtractedContent, known_tags: &[String]) -> String {
    let known = serde_json::to_string(known_tags).unwrap_or_else(|_| "[]".into());
    let title_only = content.is_title_only() && content.has(ContentSource::Title);

    let mut prompt = String::new();
    if title_only {
        prompt.push_str(
            "Please suggest 3-5 relevant tags for this document based only on its title.\n",
        );
    } else {
        prompt.push_str("Please analyze this document and suggest 3-5 relevant tags.\n");
    }
    prompt.push_str(&format!(
        "Apply suitable tags from this existing set: {known}\n"
    ));
    prompt.push_str(
        "Create new tags if one of the central concepts from the paper is not among the \
         existing tags. The document is already from an AI/ML collection, so refrain from \
         setting generic tags like 'Machine Learning' or 'Computer Science'.\n",
    );
    prompt.push_str(
        "Tags should be in Capital Case with spaces as separators \
         (e.g., LLM Jailbreaking, Protein Design, ...)\n",
    );
    if title_only {
        prompt.push_str("Be conservative with tag suggestions when working with title only.\n");
    }
    prompt.push('\n');
    prompt.push_str(&content.render());
    prompt.push_str("\n\nPlease respond with ONLY the tags, one per line, nothing else.");
    prompt
}

/// Leading list markers: `-`, `*`, `•`, `1.`, `2)`, `(3)`.
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•+]|\d+[.)]|\(\d+\))\s*").unwrap());

/// Openers of conversational lines such as "Here are the tags" or
/// "Based on the abstract".
static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:here|these|this|based on|the following|below|sure|certainly|i|i'd|i've)\b")
        .unwrap()
});

/// Longest string accepted as a tag.
const MAX_TAG_CHARS: usize = 64;
const MAX_TAG_WORDS: usize = 8;

/// Parse a model reply into tags, tolerating list formatting and quoting.
///
/// Order is preserved and duplicates are dropped.
pub fn parse_tags(response: &str) -> SuggestResult<Vec<String>> {
    let lines: Vec<&str> = response
        .lines()
        .map(str::trim)
        .map(strip_lead_in)
        .filter(|l| !l.is_empty())
        .collect();

    // A single comma-separated line is treated as a list.
    let candidates: Vec<&str> = if lines.len() == 1 && lines[0].contains(',') {
        lines[0].split(',').collect()
    } else {
        lines
    };

    let mut tags: Vec<String> = Vec::new();
    for candidate in candidates {
        let Some(tag) = clean_tag(candidate) else {
            continue;
        };
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if tags.is_empty() {
        return Err(SuggestError::Parse {
            message: format!("no tags in {:?}", truncate_for_error(response)),
        });
    }
    Ok(tags)
}

/// Drop a lead-in like "Here are the suggested tags:" from the front of a
/// line that carries tags after the colon.
fn strip_lead_in(line: &str) -> &str {
    match line.split_once(':') {
        Some((head, rest))
            if !rest.trim().is_empty()
                && (PREAMBLE.is_match(head.trim()) || head.to_lowercase().contains("tag")) =>
        {
            rest.trim()
        }
        _ => line,
    }
}

/// Normalize one candidate line, or `None` if it doesn't look like a tag.
fn clean_tag(raw: &str) -> Option<String> {
    let line = raw.trim();
    // Preamble such as "Here are the tags:" or a closing sentence.
    if line.ends_with(':') || line.ends_with('.') {
        return None;
    }
    let line = LIST_MARKER.replace(line, "");
    let line = line
        .trim()
        .trim_end_matches([',', ';'])
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '“' | '”' | '*'))
        .trim();

    if line.is_empty()
        || PREAMBLE.is_match(line)
        || line.chars().count() > MAX_TAG_CHARS
        || line.split_whitespace().count() > MAX_TAG_WORDS
    {
        return None;
    }
    Some(line.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn truncate_for_error(text: &str) -> String {
    let mut out: String = text.chars().take(200).collect();
    if text.chars().count() > 200 {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct CannedClient {
        reply: SuggestResult<String>,
        prompts: RefCell<Vec<String>>,
    }

    impl CompletionClient for CannedClient {
        fn complete(&self, _system: &str, prompt: &str) -> SuggestResult<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match &self.reply {
                Ok(r) => Ok(r.clone()),
                Err(e) => Err(SuggestError::Api {
                    message: e.to_string(),
                }),
            }
        }
    }

    fn content() -> ExtractedContent {
        let mut content = ExtractedContent::default();
        content.push(ContentSource::Title, "Biosecurity Policy");
        content.push(ContentSource::Abstract, "A paper about biosecurity policy");
        content
    }

    #[test]
    fn parse_plain_lines() {
        let tags = parse_tags("Biosecurity\nAI Governance\n").unwrap();
        assert_eq!(tags, vec!["Biosecurity", "AI Governance"]);
    }

    #[test]
    fn parse_numbered_bulleted_and_quoted() {
        let response = "Here are the tags:\n\n1. \"LLM Jailbreaking\"\n2) Protein Design,\n- `Red Teaming`\n•  Biosecurity \n* **Evals**";
        let tags = parse_tags(response).unwrap();
        assert_eq!(
            tags,
            vec![
                "LLM Jailbreaking",
                "Protein Design",
                "Red Teaming",
                "Biosecurity",
                "Evals"
            ]
        );
    }

    #[test]
    fn parse_comma_separated_line() {
        let tags = parse_tags("Biosecurity, Security, Biosecurity").unwrap();
        assert_eq!(tags, vec!["Biosecurity", "Security"]);
    }

    #[test]
    fn parse_drops_prose() {
        let response = "I think this paper is about a great many different things and it is hard to say\nSecurity";
        assert_eq!(parse_tags(response).unwrap(), vec!["Security"]);
    }

    #[test]
    fn parse_single_line_with_lead_in() {
        let tags = parse_tags("Here are the suggested tags: Biosecurity, AI Governance").unwrap();
        assert_eq!(tags, vec!["Biosecurity", "AI Governance"]);

        let tags = parse_tags("Tags: Protein Design").unwrap();
        assert_eq!(tags, vec!["Protein Design"]);
    }

    #[test]
    fn parse_drops_conversational_lines() {
        let response = "Here are some relevant tags\nBiosecurity\nBased on the abstract\n\
                        AI Governance\nThese cover the main topics.";
        assert_eq!(parse_tags(response).unwrap(), vec!["Biosecurity", "AI Governance"]);
    }

    #[test]
    fn parse_nothing_fails() {
        assert!(matches!(parse_tags("   \n\n"), Err(SuggestError::Parse { .. })));
        assert!(matches!(parse_tags("Tags:\n-\n\"\""), Err(SuggestError::Parse { .. })));
    }

    #[test]
    fn prompt_embeds_known_tags_and_content() {
        let prompt = build_prompt(&content(), &["AI".to_string(), "Security".to_string()]);
        assert!(prompt.contains(r#"["AI","Security"]"#));
        assert!(prompt.contains("Title: Biosecurity Policy\nAbstract: A paper about biosecurity policy"));
        assert!(prompt.starts_with("Please analyze this document"));
        assert!(prompt.ends_with("one per line, nothing else."));
    }

    #[test]
    fn title_only_prompt_is_conservative() {
        let mut content = ExtractedContent::default();
        content.push(ContentSource::Title, "Sparse Autoencoders");
        let prompt = build_prompt(&content, &[]);
        assert!(prompt.contains("based only on its title"));
        assert!(prompt.contains("Be conservative"));
    }

    #[test]
    fn suggester_parses_client_reply() {
        let client = CannedClient {
            reply: Ok("Biosecurity\nSecurity".into()),
            prompts: RefCell::new(Vec::new()),
        };
        let suggester = LlmSuggester::new(client);
        let tags = suggester.suggest(&content(), &["Security".into()]).unwrap();
        assert_eq!(tags, vec!["Biosecurity", "Security"]);
        assert_eq!(suggester.client.prompts.borrow().len(), 1);
    }

    #[test]
    fn suggester_propagates_api_error() {
        let client = CannedClient {
            reply: Err(SuggestError::Api {
                message: "rate limited".into(),
            }),
            prompts: RefCell::new(Vec::new()),
        };
        let suggester = LlmSuggester::new(client);
        let err = suggester.suggest(&content(), &[]).unwrap_err();
        assert!(matches!(err, SuggestError::Api { .. }));
    }
}
