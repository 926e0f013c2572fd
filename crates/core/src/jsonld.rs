//! Structured-data (JSON-LD) article extraction.
//!
//! Pages that embed a schema.org article object with a full
//! `articleBody` give us clean text for free, so this strategy runs
//! before any DOM scraping. Short bodies are teasers for paywalled or
//! truncated content and are rejected; the DOM strategies usually do
//! better on those pages.

use crate::article::{ArticleRecord, ExtractionSource, excerpt_of};
use crate::metadata;
use dom_query::{Document, Selection};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Minimum `articleBody` length (characters) for a structured-data
/// object to count as the full article rather than a teaser.
pub const MIN_BODY_LENGTH: usize = 500;

/// Schema.org types treated as articles, matched case-insensitively.
const ARTICLE_TYPES: &[&str] = &[
    "Article",
    "NewsArticle",
    "BlogPosting",
    "Report",
    "TechArticle",
    "ScholarlyArticle",
    "SocialMediaPosting",
];

static PARAGRAPH_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Try to build a record from the page's JSON-LD blocks.
///
/// Malformed JSON, non-article objects, and short bodies are all
/// silent misses.
pub fn try_structured_data(doc: &Document, url: &Url) -> Option<ArticleRecord> {
    for node in doc.select(r#"script[type="application/ld+json"]"#).nodes() {
        let raw = Selection::from(*node).text();
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                debug!("skipping malformed JSON-LD block: {err}");
                continue;
            }
        };

        for candidate in flatten_candidates(value) {
            let candidate = unwrap_main_entity(candidate);
            if let Some(record) = record_from_object(&candidate, doc, url) {
                return Some(record);
            }
        }
    }
    None
}

/// One JSON-LD script can hold a single object, an array of objects,
/// or a `@graph` collection.
fn flatten_candidates(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let graph = map.remove("@graph");
            let mut out = vec![Value::Object(map)];
            if let Some(Value::Array(items)) = graph {
                out.extend(items);
            }
            out
        }
        _ => Vec::new(),
    }
}

/// A `WebPage` wrapping its article in `mainEntity` stands for that
/// entity.
fn unwrap_main_entity(value: Value) -> Value {
    if value.get("@type").and_then(Value::as_str) == Some("WebPage") {
        if let Some(entity) = value.get("mainEntity") {
            if entity.is_object() {
                return entity.clone();
            }
        }
    }
    value
}

fn is_article_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => type_accepted(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(type_accepted),
        _ => false,
    }
}

fn type_accepted(name: &str) -> bool {
    ARTICLE_TYPES.iter().any(|accepted| accepted.eq_ignore_ascii_case(name))
}

fn record_from_object(value: &Value, doc: &Document, url: &Url) -> Option<ArticleRecord> {
    if !is_article_type(value) {
        return None;
    }
    let body = value.get("articleBody").and_then(Value::as_str)?.trim();
    if body.chars().count() <= MIN_BODY_LENGTH {
        debug!(length = body.chars().count(), "JSON-LD body too short, treating as teaser");
        return None;
    }

    let page = metadata::page_metadata(doc);
    let title = string_field(value, "headline")
        .or_else(|| string_field(value, "name"))
        .or(page.title)
        .unwrap_or_else(|| metadata::title_from_url(url));
    let byline = author_name(value.get("author")).or(page.byline);
    let site_name = value
        .get("publisher")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or(page.site_name)
        .or_else(|| metadata::site_name_from_url(url));
    let published_time = string_field(value, "datePublished").or(page.published_time);
    let lang = string_field(value, "inLanguage").or(page.lang);
    let excerpt = string_field(value, "description").unwrap_or_else(|| excerpt_of(body));

    Some(ArticleRecord {
        title,
        byline,
        site_name,
        content: body_to_html(body),
        text_content: body.to_string(),
        length: body.chars().count(),
        excerpt,
        url: url.to_string(),
        published_time,
        lang,
        source: ExtractionSource::JsonLd,
    })
}

/// Plain-text body to minimal HTML: blank-line boundaries become
/// paragraph elements.
fn body_to_html(body: &str) -> String {
    PARAGRAPH_SPLIT_RE
        .split(body)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", p))
        .collect::<Vec<_>>()
        .join("\n")
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `author` may be a string, a Person object, or an array of either.
fn author_name(author: Option<&Value>) -> Option<String> {
    match author? {
        Value::String(name) => Some(name.trim().to_string()).filter(|n| !n.is_empty()),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        Value::Array(items) => items.iter().find_map(|item| author_name(Some(item))),
        _ => None,
    }
}
