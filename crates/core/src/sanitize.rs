//! Sanitizer pipeline for extracted body markup.
//!
//! Runs over a detached fragment (clones of the matched body nodes,
//! never the live page document) in a fixed order: strip directives,
//! image-source stripping, optional structural pruning, optional
//! whitespace tidying. Every pass is idempotent, so re-sanitizing
//! already-clean output changes nothing.

use crate::selector;
use crate::siteconfig::RuleSet;
use dom_query::{Document, Selection};
use regex::Regex;
use std::sync::LazyLock;

static BR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:<br[^>]*>\s*){2,}").unwrap());
static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static INTERTAG_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">[ \t]*\n\s*<").unwrap());
static WS_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static BLOCK_BOUNDARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</(?:p|div|section|article|blockquote|li|ul|ol|dl|dt|dd|h[1-6]|table|thead|tbody|tr|td|th|figure|figcaption|pre|header|footer|aside)>|<(?:br|hr)[^>]*>",
    )
    .unwrap()
});

/// Tags removed wholesale by the prune pass.
const PRUNE_TAGS: &str = "input, button, nav, object, iframe, canvas";

/// Attributes used internally while scoring candidates; never part of
/// the output.
const BOOKKEEPING_ATTRS: &[&str] = &["data-candidate", "data-content-score"];

/// Attributes the tidy pass drops when their value is empty or
/// whitespace-only.
const TIDY_EMPTY_ATTRS: &[&str] =
    &["class", "id", "style", "align", "border", "width", "height", "title"];

/// Sanitized body markup and its plain-text rendering, always derived
/// from the same final tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedContent {
    pub html: String,
    pub text: String,
}

impl CleanedContent {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Run the full pipeline over a body fragment under `rules`.
pub fn sanitize_fragment(fragment_html: &str, rules: &RuleSet) -> CleanedContent {
    let doc = Document::from(fragment_html);

    for expr in &rules.strip {
        if let Some(sel) = selector::select_nodes(&doc, expr) {
            sel.remove();
        }
    }
    strip_image_sources(&doc, &rules.strip_image_src);
    if rules.should_prune() {
        prune(&doc);
    }
    if rules.should_tidy() {
        remove_empty_attrs(&doc);
    }

    let mut html = body_inner_html(&doc);
    if rules.should_prune() {
        html = INTERTAG_WS_RE.replace_all(&html, ">\n<").into_owned();
    }
    if rules.should_tidy() {
        html = tidy(&html);
    }
    let html = html.trim().to_string();
    let text = text_of_fragment(&html);
    CleanedContent { html, text }
}

/// Remove `img` elements whose `src` contains any listed substring.
fn strip_image_sources(doc: &Document, patterns: &[String]) {
    if patterns.is_empty() {
        return;
    }
    for node in doc.select("img").nodes() {
        let sel = Selection::from(*node);
        let Some(src) = sel.attr("src") else { continue };
        if patterns.iter().any(|p| src.contains(p.as_str())) {
            sel.remove();
        }
    }
}

/// Structural prune: interactive and embedded elements, duplicate
/// top-level headings, nofollow links, bookkeeping attributes, and
/// empty leaves.
pub(crate) fn prune(doc: &Document) {
    doc.select(PRUNE_TAGS).remove();
    // The record carries the title separately; an h1 inside the body
    // would duplicate it.
    doc.select("h1").remove();
    doc.select("a[rel*=\"nofollow\"]").remove();
    for attr in BOOKKEEPING_ATTRS.iter().copied() {
        doc.select(&format!("[{attr}]")).remove_attr(attr);
    }
    remove_empty_leaves(doc);
}

/// Remove leaf elements with no content, repeating until none remain
/// so that parents emptied by a removal go too.
fn remove_empty_leaves(doc: &Document) {
    loop {
        let mut removed = false;
        for node in doc.select("body *").nodes() {
            let Some(name) = node.node_name() else { continue };
            if matches!(name.to_lowercase().as_str(), "img" | "br" | "hr") {
                continue;
            }
            let has_element_child = node.children().iter().any(dom_query::NodeRef::is_element);
            if has_element_child {
                continue;
            }
            let sel = Selection::from(*node);
            if sel.text().trim().is_empty() {
                sel.remove();
                removed = true;
            }
        }
        if !removed {
            break;
        }
    }
}

/// Drop listed attributes whose values carry no content. Runs on the
/// DOM so text that merely quotes an attribute is untouched.
fn remove_empty_attrs(doc: &Document) {
    for node in doc.select("body *").nodes() {
        let sel = Selection::from(*node);
        for attr in TIDY_EMPTY_ATTRS.iter().copied() {
            if sel.attr(attr).is_some_and(|v| v.trim().is_empty()) {
                sel.remove_attr(attr);
            }
        }
    }
}

/// Whitespace tidy: double line breaks become paragraph boundaries and
/// space runs collapse.
fn tidy(html: &str) -> String {
    let html = BR_RUN_RE.replace_all(html, "</p>\n<p>");
    SPACE_RUN_RE.replace_all(&html, " ").into_owned()
}

/// Inner markup of the parsed fragment's body wrapper.
fn body_inner_html(doc: &Document) -> String {
    doc.select("body").inner_html().trim().to_string()
}

/// Plain text of an HTML fragment with whitespace normalized. Block
/// element boundaries count as whitespace, so adjacent paragraphs do
/// not run together even when the markup has no inter-tag whitespace.
pub(crate) fn text_of_fragment(html: &str) -> String {
    let html = BLOCK_BOUNDARY_RE.replace_all(html, "$0 ");
    let doc = Document::from(html.as_ref());
    collapse_whitespace(&doc.select("body").text())
}

/// Collapse all whitespace runs to single spaces and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    WS_RUN_RE.replace_all(text.trim(), " ").into_owned()
}
