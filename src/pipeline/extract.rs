//! Text extraction: normalised, human-readable text from HTML and PDF.
//!
//! Two distinct HTML selection policies live here because the two inputs have
//! different noise profiles. Job-board inline text should be read broadly
//! (any visible text node), while scraped career pages are full of navigation
//! chrome and are restricted to heading/paragraph semantics:
//!
//! * [`visible_text`] — every text node whose nearest container passes the
//!   visibility predicate, joined with single spaces.
//! * [`heading_paragraph_text`] — `h1`–`h6` and `p` elements only, joined
//!   with newlines.
//!
//! Both are pure functions of their input: same HTML in, byte-identical text
//! out. The visibility predicate itself is a standalone function over a
//! node's container tag and class set so it can be unit-tested in isolation.

use crate::error::{JobwatchError, PostingError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use tracing::debug;

/// Container tags whose text is never user-visible content.
///
/// `html` covers stray text attached directly to the document root after
/// parser fix-up; `i` drops decorative icon glyphs that some job boards ship
/// inside inline-italic elements.
const HIDDEN_CONTAINER_TAGS: &[&str] = &["style", "script", "head", "title", "meta", "html", "i"];

/// Marker classes for presentational chrome (menus, buttons, nav headers).
const HIDDEN_MARKER_CLASSES: &[&str] = &["dropdown-title", "btn", "nav__title"];

/// Sent on career-page fetches; several boards refuse requests without a
/// browser-like identity.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

static CONTENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6, p").unwrap());

/// Decide whether a text node is user-visible content.
///
/// `container_tag` is the tag name of the node's nearest element ancestor
/// (`None` when the node hangs off the document root), `classes` that
/// element's class attribute.
pub fn is_visible(container_tag: Option<&str>, classes: &[&str]) -> bool {
    let Some(tag) = container_tag else {
        return false;
    };
    if HIDDEN_CONTAINER_TAGS.contains(&tag) {
        return false;
    }
    !classes
        .iter()
        .any(|class| HIDDEN_MARKER_CLASSES.contains(class))
}

/// Extract all visible text from an HTML document.
///
/// Walks every text node in document order, keeps those whose nearest
/// container passes [`is_visible`], trims each and joins with single spaces.
/// Comment nodes and markup never appear in the output.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let visible = match node.parent().and_then(ElementRef::wrap) {
            Some(container) => {
                let classes: Vec<&str> = container.value().classes().collect();
                is_visible(Some(container.value().name()), &classes)
            }
            None => false,
        };
        if !visible {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}

/// Extract heading and paragraph text from an HTML document.
///
/// The restricted variant used on scraped career pages: only `h1`–`h6` and
/// `p` elements are considered, each filtered through [`is_visible`] (its
/// own classes, its parent's tag), and the surviving elements' text is
/// joined with newlines in document order.
pub fn heading_paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<String> = Vec::new();

    for element in document.select(&CONTENT_SELECTOR) {
        let parent_tag = element
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| parent.value().name());
        let classes: Vec<&str> = element.value().classes().collect();
        if !is_visible(parent_tag, &classes) {
            continue;
        }
        let text: String = element.text().collect();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }

    parts.join("\n")
}

/// Extract the text of a PDF document, pages in order, each page followed by
/// a blank-line separator.
///
/// Fatal on a missing or unparsable file: the only PDF in this pipeline is
/// the résumé, and without it no scoring is possible.
pub fn pdf_text(path: &Path) -> Result<String, JobwatchError> {
    let raw = pdf_extract::extract_text(path).map_err(|e| JobwatchError::ResumeUnreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    // pdf-extract separates pages with form feeds.
    let pages: Vec<&str> = raw.split('\u{0c}').collect();
    debug!("extracted {} page(s) from {}", pages.len(), path.display());
    Ok(join_pages(&pages))
}

/// Concatenate page texts in ascending page order, a blank line after each.
pub(crate) fn join_pages(pages: &[&str]) -> String {
    let mut out = String::with_capacity(pages.iter().map(|p| p.len() + 2).sum());
    for page in pages {
        out.push_str(page);
        out.push_str("\n\n");
    }
    out
}

/// Fetches the raw HTML of a posting's linked page.
///
/// A trait seam so tests can substitute canned pages; the pipeline treats
/// every failure here as best-effort (the posting survives with an empty
/// description).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, PostingError>;
}

/// [`PageFetcher`] over HTTP with a browser-like identifying header.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(BROWSER_USER_AGENT)
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PostingError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| PostingError::ScrapeFailed {
                    url: url.to_string(),
                    detail: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(PostingError::ScrapeFailed {
                url: url.to_string(),
                detail: format!("HTTP {}", response.status()),
            });
        }

        response.text().await.map_err(|e| PostingError::ScrapeFailed {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }
}
