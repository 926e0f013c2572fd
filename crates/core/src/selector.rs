//! Directive selector compilation and evaluation.
//!
//! Site profiles express node selection in the FTR XPath subset
//! (`//div[@class='articleText']`, `//meta[@property='og:title']/@content`,
//! `//*[contains(@class, 'sidebar')]`). This module compiles those
//! expressions into CSS selectors evaluated through `dom_query`. An
//! expression outside the supported subset compiles to nothing, which
//! callers treat as a silent empty result; directive evaluation never
//! raises on a selector it cannot understand.

use dom_query::{Document, Selection};
use regex::Regex;
use std::sync::LazyLock;

static STEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\w+|\*)(?:\[(.+)\])?$").unwrap());
static ATTR_EQ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^@([\w:-]+)\s*=\s*'([^']*)'$").unwrap());
static CONTAINS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^contains\(@(class|id),\s*'([^']+)'\)$").unwrap());
static ID_OR_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^contains\(@class,\s*'([^']+)'\)\s+or\s+contains\(@id,\s*'([^']+)'\)$").unwrap()
});

/// A directive expression compiled for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledSelector {
    /// Selects element nodes.
    Nodes(String),
    /// Selects an attribute value from matching elements.
    Attr { css: String, attr: String },
}

/// Compile an FTR selector expression to its CSS form.
///
/// Returns `None` for expressions outside the supported subset
/// (positional predicates, functions other than `contains`, axes).
pub fn compile(expr: &str) -> Option<CompiledSelector> {
    let expr = expr.trim();

    let (expr, attr) = match expr.rsplit_once("/@") {
        Some((head, name)) if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '-') => {
            (head, Some(name.to_string()))
        }
        _ => (expr, None),
    };
    let expr = expr.strip_suffix("/text()").unwrap_or(expr);

    let body = expr.strip_prefix("//")?;
    if body.is_empty() {
        return None;
    }

    let mut css = String::new();
    let segments: Vec<&str> = body.split("//").collect();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            css.push(' ');
        }
        for (j, step) in segment.split('/').enumerate() {
            if j > 0 {
                css.push_str(" > ");
            }
            let step_css = compile_step(step, segments.len() == 1 && segment.split('/').count() == 1)?;
            css.push_str(&step_css);
        }
    }

    match attr {
        Some(attr) => Some(CompiledSelector::Attr { css, attr }),
        None => Some(CompiledSelector::Nodes(css)),
    }
}

/// Compile one location step (`tag[predicate]`) to CSS.
///
/// The `or`-joined id-or-class form expands to a selector group, so it
/// is only accepted when the step stands alone (`sole_step`).
fn compile_step(step: &str, sole_step: bool) -> Option<String> {
    let captures = STEP_RE.captures(step.trim())?;
    let tag = captures.get(1).map(|m| m.as_str()).unwrap_or("*");
    let tag_css = if tag == "*" { "" } else { tag };

    let Some(predicate) = captures.get(2).map(|m| m.as_str().trim()) else {
        return if tag == "*" { None } else { Some(tag.to_string()) };
    };

    if let Some(caps) = ID_OR_CLASS_RE.captures(predicate) {
        if !sole_step {
            return None;
        }
        let class_pat = css_quote(caps.get(1).map_or("", |m| m.as_str()))?;
        let id_pat = css_quote(caps.get(2).map_or("", |m| m.as_str()))?;
        return Some(format!(
            "{tag}[class*=\"{class_pat}\"], {tag}[id*=\"{id_pat}\"]",
            tag = tag_css
        ));
    }

    if let Some(caps) = CONTAINS_RE.captures(predicate) {
        let attr = caps.get(1).map_or("", |m| m.as_str());
        let value = css_quote(caps.get(2).map_or("", |m| m.as_str()))?;
        return Some(format!("{}[{}*=\"{}\"]", tag_css, attr, value));
    }

    if let Some(caps) = ATTR_EQ_RE.captures(predicate) {
        let attr = caps.get(1).map_or("", |m| m.as_str());
        let value = css_quote(caps.get(2).map_or("", |m| m.as_str()))?;
        return Some(format!("{}[{}=\"{}\"]", tag_css, attr, value));
    }

    None
}

/// Reject values that cannot be embedded in a double-quoted CSS string.
fn css_quote(value: &str) -> Option<&str> {
    if value.contains('"') || value.contains('\\') { None } else { Some(value) }
}

/// Resolve a directive expression to element nodes.
///
/// Returns `Some` only when the expression compiles to a node selector
/// and matches at least one element.
pub fn select_nodes<'a>(doc: &'a Document, expr: &str) -> Option<Selection<'a>> {
    match compile(expr)? {
        CompiledSelector::Nodes(css) => {
            let sel = doc.try_select(&css)?;
            if sel.exists() { Some(sel) } else { None }
        }
        CompiledSelector::Attr { .. } => None,
    }
}

/// Resolve a directive expression to its first non-empty string value.
///
/// Attribute expressions read the attribute; node expressions read the
/// node's text content.
pub fn select_string(doc: &Document, expr: &str) -> Option<String> {
    match compile(expr)? {
        CompiledSelector::Nodes(css) => {
            let sel = doc.try_select(&css)?;
            for node in sel.nodes() {
                let text = Selection::from(*node).text();
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
            None
        }
        CompiledSelector::Attr { css, attr } => {
            let sel = doc.try_select(&css)?;
            for node in sel.nodes() {
                if let Some(value) = Selection::from(*node).attr(&attr) {
                    let value = value.trim();
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
            None
        }
    }
}
