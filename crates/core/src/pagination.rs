//! Multi-page article handling.
//!
//! When the active profile carries a `single_page_link` directive, the
//! linked view is fetched and its body replaces the paginated content
//! outright. Otherwise a `next_page_link` directive drives the merger:
//! it follows the link page by page, resolves each page's body with
//! the same body directives used for page one, and splices the results
//! into one document with a visible page-break marker. Fetching is the
//! only suspending step in the whole engine and is injected through
//! [`PageFetcher`].

use crate::article::ArticleRecord;
use crate::error::Result;
use crate::extract;
use crate::selector::{self, CompiledSelector};
use crate::siteconfig::RuleSet;
use dom_query::Document;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Safety bound on total pages (the first page included).
pub const MAX_PAGINATION_PAGES: usize = 5;

/// Marker inserted between merged page bodies.
pub const PAGE_BREAK: &str = r#"<hr data-page-break="true" />"#;

/// Injected page-fetching capability.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Limits for the merge loop.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Total page cap, first page included.
    pub max_pages: usize,
    /// Deadline per page fetch.
    pub fetch_timeout: Duration,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { max_pages: MAX_PAGINATION_PAGES, fetch_timeout: Duration::from_secs(30) }
    }
}

/// Follow next-page links from `first_page` and extend `record` with
/// each page's body.
///
/// Fetch failures and timeouts end the merge but keep everything
/// accumulated so far; a partial multi-page article beats none.
pub async fn merge_pages<F: PageFetcher>(
    fetcher: &F,
    first_page: &Document,
    rules: &RuleSet,
    base_url: &Url,
    record: &mut ArticleRecord,
    config: &PaginationConfig,
) {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(normalize(base_url));

    let mut content = record.content.clone();
    let mut text = record.text_content.clone();
    let mut pages = 1;
    let mut next = next_page_url(first_page, rules, base_url);

    while let Some(url) = next {
        if pages >= config.max_pages {
            debug!(limit = config.max_pages, "pagination page cap reached");
            break;
        }
        if url.origin() != base_url.origin() {
            debug!(next = %url, "next-page link leaves the origin, stopping");
            break;
        }
        if !visited.insert(normalize(&url)) {
            debug!(next = %url, "next-page link already visited, stopping");
            break;
        }

        let html = match tokio::time::timeout(config.fetch_timeout, fetcher.fetch(&url)).await {
            Ok(Ok(html)) => html,
            Ok(Err(err)) => {
                warn!(page = %url, "page fetch failed, keeping accumulated pages: {err}");
                break;
            }
            Err(_) => {
                warn!(page = %url, timeout = ?config.fetch_timeout, "page fetch timed out, keeping accumulated pages");
                break;
            }
        };

        let page_doc = Document::from(extract::preprocess(&html, rules));
        let Some(body) = extract::resolve_body(&page_doc, rules) else {
            debug!(page = %url, "no body resolved on continuation page, stopping");
            break;
        };

        content.push('\n');
        content.push_str(PAGE_BREAK);
        content.push('\n');
        content.push_str(&body.html);
        text.push(' ');
        text.push_str(&body.text);
        pages += 1;

        next = next_page_url(&page_doc, rules, &url);
    }

    if pages > 1 {
        debug!(pages, "merged paginated article");
        record.replace_content(content, text);
    }
}

/// Follow the profile's single-page view link, if any, and replace the
/// record's content with the body extracted from that view.
///
/// Returns `true` when the rewrite succeeded. Any failure leaves the
/// record untouched so the caller can still merge next-page links.
pub async fn resolve_single_page<F: PageFetcher>(
    fetcher: &F,
    first_page: &Document,
    rules: &RuleSet,
    base_url: &Url,
    record: &mut ArticleRecord,
    config: &PaginationConfig,
) -> bool {
    let Some(url) = link_url(first_page, &rules.single_page_link, base_url) else {
        return false;
    };
    if url.origin() != base_url.origin() {
        debug!(single_page = %url, "single-page link leaves the origin, ignoring");
        return false;
    }
    if normalize(&url) == normalize(base_url) {
        return false;
    }

    let html = match tokio::time::timeout(config.fetch_timeout, fetcher.fetch(&url)).await {
        Ok(Ok(html)) => html,
        Ok(Err(err)) => {
            warn!(page = %url, "single-page fetch failed, keeping paginated view: {err}");
            return false;
        }
        Err(_) => {
            warn!(page = %url, timeout = ?config.fetch_timeout, "single-page fetch timed out, keeping paginated view");
            return false;
        }
    };

    let page_doc = Document::from(extract::preprocess(&html, rules));
    let Some(body) = extract::resolve_body(&page_doc, rules) else {
        debug!(page = %url, "no body resolved on single-page view, keeping paginated view");
        return false;
    };
    record.replace_content(body.html, body.text);
    true
}

/// Resolve the first next-page directive to an absolute, same-scheme
/// URL with any fragment dropped.
fn next_page_url(doc: &Document, rules: &RuleSet, base: &Url) -> Option<Url> {
    link_url(doc, &rules.next_page_link, base)
}

/// First directive in `exprs` that yields a joinable href.
fn link_url(doc: &Document, exprs: &[String], base: &Url) -> Option<Url> {
    for expr in exprs {
        let href = match selector::compile(expr) {
            Some(CompiledSelector::Nodes(css)) => doc
                .try_select(&css)
                .map(|sel| sel.attr("href"))
                .and_then(|href| href.map(|h| h.to_string())),
            Some(CompiledSelector::Attr { css, attr }) => doc
                .try_select(&css)
                .map(|sel| sel.attr(&attr))
                .and_then(|value| value.map(|v| v.to_string())),
            None => None,
        };
        let Some(href) = href else { continue };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }
        if let Ok(mut url) = base.join(href) {
            url.set_fragment(None);
            return Some(url);
        }
    }
    None
}

/// URL identity for cycle detection: fragment-free text form.
fn normalize(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}
