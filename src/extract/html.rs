//! Main-content extraction from HTML using the `scraper` crate.
//!
//! Text inside `script`, `style`, `nav`, `header` and `footer` is ignored.
//! The first content container found (`article`, `main`, `.content`,
//! `.post`, `.entry`) supplies the text; otherwise the whole `body` does.

use scraper::{ElementRef, Html, Selector};

use crate::extract::MAX_WORDS;
use crate::model::truncate_words;

/// Elements whose text never counts as page content.
const HIDDEN: &[&str] = &["script", "style", "nav", "header", "footer", "noscript"];

/// Content containers, tried in order.
const CONTAINERS: &[&str] = &["article", "main", ".content", ".post", ".entry"];

/// Extract the main text of an HTML page, capped at [`MAX_WORDS`] words.
pub fn main_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut content = String::new();
    for container in CONTAINERS {
        let Ok(sel) = Selector::parse(container) else {
            continue;
        };
        let found: Vec<ElementRef> = document.select(&sel).collect();
        if !found.is_empty() {
            content = found
                .into_iter()
                .map(visible_text)
                .collect::<Vec<_>>()
                .join(" ");
            break;
        }
    }

    if content.trim().is_empty() {
        let body = Selector::parse("body").expect("static selector must parse");
        if let Some(el) = document.select(&body).next() {
            content = visible_text(el);
        }
    }

    truncate_words(&content, MAX_WORDS)
}

/// Text under `root`, skipping hidden subtrees.
fn visible_text(root: ElementRef) -> String {
    let mut parts = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|a| a.id() != root.id())
            .chain(std::iter::once(*root))
            .filter_map(|a| a.value().as_element())
            .any(|el| HIDDEN.iter().any(|h| *h == el.name()));
        if hidden {
            continue;
        }
        let text = text.trim();
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join(" ")
}
