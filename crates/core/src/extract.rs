//! Extraction orchestration.
//!
//! [`Extractor`] runs the three strategies over a page snapshot in
//! fixed trust order: structured data, then the site profile (when one
//! exists and does not defer to structured data), then the heuristic
//! scorer. The first strategy to produce non-empty body text wins;
//! there is no cross-strategy scoring. Only when all three miss does
//! extraction fail.

use crate::article::{ArticleRecord, ExtractionSource, excerpt_of};
use crate::error::{ExtractError, Result};
use crate::heuristic;
use crate::jsonld;
use crate::metadata;
use crate::pagination::{self, PageFetcher, PaginationConfig};
use crate::sanitize::{self, CleanedContent};
use crate::selector;
use crate::siteconfig::{ProfileStore, RuleSet};
use dom_query::Document;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    StructuredData,
    SiteConfig,
    Heuristic,
}

/// Trust order. Strategy order is the ranking; nothing re-scores
/// across strategies.
const STRATEGY_ORDER: [Strategy; 3] =
    [Strategy::StructuredData, Strategy::SiteConfig, Strategy::Heuristic];

/// Article extraction engine over a profile store.
pub struct Extractor {
    store: ProfileStore,
}

impl Extractor {
    pub fn new(store: ProfileStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Extract an article from a fetched HTML snapshot.
    pub fn extract(&self, url: &str, html: &str) -> Result<ArticleRecord> {
        let parsed_url = Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
        let host = parsed_url
            .host_str()
            .ok_or_else(|| ExtractError::InvalidUrl(format!("URL has no host: {url}")))?;

        let rules = self.store.resolve(host);
        let html = match &rules {
            Some(rules) => preprocess(html, rules),
            None => html.to_string(),
        };
        let doc = Document::from(html);

        for strategy in STRATEGY_ORDER {
            let record = match strategy {
                Strategy::StructuredData => jsonld::try_structured_data(&doc, &parsed_url),
                Strategy::SiteConfig => match &rules {
                    Some(rules) if !rules.prefer_structured_data => {
                        extract_with_profile(&doc, rules, &parsed_url)
                    }
                    Some(_) => {
                        debug!(host, "profile defers to structured data, skipping");
                        None
                    }
                    None => None,
                },
                Strategy::Heuristic => heuristic::extract_heuristically(&doc, &parsed_url),
            };
            if let Some(record) = record {
                if !record.text_content.is_empty() {
                    info!(url, source = %record.source, length = record.length, "extracted article");
                    return Ok(record);
                }
            }
        }

        Err(ExtractError::ExtractionFailed { url: url.to_string() })
    }

    /// The resolved rule set for a URL's host, if any. Used by the
    /// pagination merger to reuse the page-one body directives.
    pub fn rules_for(&self, url: &Url) -> Option<std::sync::Arc<RuleSet>> {
        url.host_str().and_then(|host| self.store.resolve(host))
    }

    /// Extract and resolve multi-page articles: a profile-declared
    /// single-page view replaces the content outright, otherwise
    /// next-page links are merged into the record.
    pub async fn extract_paginated<F: PageFetcher>(
        &self,
        url: &str,
        html: &str,
        fetcher: &F,
        config: &PaginationConfig,
    ) -> Result<ArticleRecord> {
        let mut record = self.extract(url, html)?;
        if record.source != ExtractionSource::SiteConfig {
            return Ok(record);
        }
        let parsed_url = Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
        let Some(rules) = self.rules_for(&parsed_url) else {
            return Ok(record);
        };
        if rules.single_page_link.is_empty() && rules.next_page_link.is_empty() {
            return Ok(record);
        }

        let doc = Document::from(preprocess(html, &rules));
        if !rules.single_page_link.is_empty()
            && pagination::resolve_single_page(fetcher, &doc, &rules, &parsed_url, &mut record, config)
                .await
        {
            return Ok(record);
        }
        if !rules.next_page_link.is_empty() {
            pagination::merge_pages(fetcher, &doc, &rules, &parsed_url, &mut record, config).await;
        }
        Ok(record)
    }
}

/// Apply the profile's find/replace pairs to the raw HTML, in file
/// order, before any parsing.
pub(crate) fn preprocess(html: &str, rules: &RuleSet) -> String {
    let mut html = html.to_string();
    for (find, replace) in &rules.replacements {
        html = html.replace(find.as_str(), replace);
    }
    html
}

/// Profile-driven extraction. Returns `None` when no body directive
/// yields non-empty sanitized text, triggering the heuristic fallback.
pub(crate) fn extract_with_profile(
    doc: &Document,
    rules: &RuleSet,
    url: &Url,
) -> Option<ArticleRecord> {
    let body = resolve_body(doc, rules)?;
    let page = metadata::page_metadata(doc);

    let title = rules
        .title
        .iter()
        .find_map(|expr| selector::select_string(doc, expr))
        .or(page.title)
        .unwrap_or_else(|| metadata::title_from_url(url));
    let byline =
        rules.author.iter().find_map(|expr| selector::select_string(doc, expr)).or(page.byline);
    let published_time =
        rules.date.iter().find_map(|expr| selector::select_string(doc, expr)).or(page.published_time);

    Some(ArticleRecord {
        title,
        byline,
        site_name: page.site_name.or_else(|| metadata::site_name_from_url(url)),
        excerpt: excerpt_of(&body.text),
        length: body.text.chars().count(),
        content: body.html,
        text_content: body.text,
        url: url.to_string(),
        published_time,
        lang: page.lang,
        source: ExtractionSource::SiteConfig,
    })
}

/// Resolve the body on a document with the profile's body directives.
///
/// Directives are tried in file order; a directive matching several
/// nodes concatenates their clones into one fragment. The first
/// directive whose sanitized fragment has non-empty text wins.
pub(crate) fn resolve_body(doc: &Document, rules: &RuleSet) -> Option<CleanedContent> {
    for expr in &rules.body {
        let Some(sel) = selector::select_nodes(doc, expr) else { continue };
        let fragment: String =
            sel.nodes().iter().map(|node| dom_query::Selection::from(*node).html().to_string()).collect();
        let cleaned = sanitize::sanitize_fragment(&fragment, rules);
        if !cleaned.is_empty() {
            return Some(cleaned);
        }
        debug!(directive = expr.as_str(), "body directive matched but sanitized to nothing");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::siteconfig::{EmptyProfileSource, ProfileSource};
    use std::io;

    struct FixedSource(&'static str);

    impl ProfileSource for FixedSource {
        fn load(&self, _host: &str) -> io::Result<Option<String>> {
            Ok(Some(self.0.to_string()))
        }
    }

    fn extractor_with(profile: &'static str) -> Extractor {
        Extractor::new(ProfileStore::new(FixedSource(profile)))
    }

    fn plain_extractor() -> Extractor {
        Extractor::new(ProfileStore::new(EmptyProfileSource))
    }

    fn long_text() -> String {
        "All the words of the article body, repeated. ".repeat(20)
    }

    #[test]
    fn test_profile_extraction_wins_over_heuristic() {
        let extractor = extractor_with(
            "title: //h1\nbody: //div[@class='articleText']\nstrip: //aside\n",
        );
        let body = long_text();
        let html = format!(
            r#"<html><head><title>Doc Title</title></head><body>
              <h1>Headline</h1>
              <div class="articleText"><p>{body}</p><aside>related</aside></div>
            </body></html>"#
        );
        let record = extractor.extract("https://example.com/story", &html).unwrap();
        assert_eq!(record.source, ExtractionSource::SiteConfig);
        assert_eq!(record.title, "Headline");
        assert!(!record.content.contains("related"));
    }

    #[test]
    fn test_structured_data_outranks_profile() {
        let extractor = extractor_with("title: //h1\nbody: //div[@class='articleText']\n");
        let body = long_text();
        let html = format!(
            r#"<html><head>
              <script type="application/ld+json">{{"@type": "Article", "headline": "From LD", "articleBody": "{body}"}}</script>
            </head><body><h1>H</h1><div class="articleText"><p>{body}</p></div></body></html>"#
        );
        let record = extractor.extract("https://example.com/story", &html).unwrap();
        assert_eq!(record.source, ExtractionSource::JsonLd);
        assert_eq!(record.title, "From LD");
    }

    #[test]
    fn test_profile_miss_falls_back_to_heuristic() {
        let extractor = extractor_with("title: //h1\nbody: //div[@class='no-such-node']\n");
        let body = long_text();
        let html = format!(
            "<html><body><h1>H</h1><div><p>{body}</p></div></body></html>"
        );
        let record = extractor.extract("https://example.com/story", &html).unwrap();
        assert_eq!(record.source, ExtractionSource::Heuristic);
    }

    #[test]
    fn test_prefer_structured_data_skips_profile() {
        let extractor = extractor_with(
            "prefer_structured_data: yes\ntitle: //h1\nbody: //div[@class='articleText']\n",
        );
        let body = long_text();
        // No JSON-LD on the page: profile is skipped, heuristic runs.
        let html = format!(
            r#"<html><body><h1>H</h1><div class="articleText"><p>{body}</p></div></body></html>"#
        );
        let record = extractor.extract("https://example.com/story", &html).unwrap();
        assert_eq!(record.source, ExtractionSource::Heuristic);
    }

    #[test]
    fn test_body_directives_short_circuit_in_order() {
        let extractor = extractor_with(
            "title: //h1\nbody: //div[@id='first']\nbody: //div[@id='second']\n",
        );
        let first = "First body text, long enough to matter. ".repeat(5);
        let second = long_text();
        let html = format!(
            r#"<html><body><h1>H</h1>
              <div id="first"><p>{first}</p></div>
              <div id="second"><p>{second}</p></div>
            </body></html>"#
        );
        let record = extractor.extract("https://example.com/story", &html).unwrap();
        assert!(record.text_content.contains("First body"));
        assert!(!record.text_content.contains(&second[..20]));
    }

    #[test]
    fn test_multi_node_body_concatenated_in_order() {
        let extractor = extractor_with("title: //h1\nbody: //div[@class='part']\n");
        let html = r#"<html><body><h1>H</h1>
          <div class="part"><p>alpha section</p></div>
          <div class="part"><p>omega section</p></div>
        </body></html>"#;
        let record = extractor.extract("https://example.com/story", html).unwrap();
        let alpha = record.text_content.find("alpha").unwrap();
        let omega = record.text_content.find("omega").unwrap();
        assert!(alpha < omega);
    }

    #[test]
    fn test_find_replace_applied_before_parse() {
        let extractor = extractor_with(
            "title: //h1\nbody: //div[@class='articleText']\nfind_string: <noscript>\nfind_string: </noscript>\nreplace_string: <div class=\"articleText\">\nreplace_string: </div>\n",
        );
        let body = long_text();
        let html = format!("<html><body><h1>H</h1><noscript><p>{body}</p></noscript></body></html>");
        let record = extractor.extract("https://example.com/story", &html).unwrap();
        assert_eq!(record.source, ExtractionSource::SiteConfig);
        assert!(record.text_content.contains("All the words"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let extractor = plain_extractor();
        assert!(matches!(
            extractor.extract("not a url", "<html></html>"),
            Err(ExtractError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_all_strategies_missing_fails() {
        let extractor = plain_extractor();
        let err = extractor.extract("https://example.com/x", "<html><body></body></html>");
        assert!(matches!(err, Err(ExtractError::ExtractionFailed { .. })));
    }

    #[test]
    fn test_profile_gap_fill_from_page_metadata() {
        let extractor = extractor_with("title: //h1\nbody: //div[@class='articleText']\n");
        let body = long_text();
        let html = format!(
            r#"<html lang="fr"><head>
              <meta name="author" content="From Meta">
              <meta property="article:published_time" content="2024-06-01">
            </head><body><h1>H</h1><div class="articleText"><p>{body}</p></div></body></html>"#
        );
        let record = extractor.extract("https://example.com/story", &html).unwrap();
        assert_eq!(record.byline.as_deref(), Some("From Meta"));
        assert_eq!(record.published_time.as_deref(), Some("2024-06-01"));
        assert_eq!(record.lang.as_deref(), Some("fr"));
    }
}
