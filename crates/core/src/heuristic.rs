//! Density-scoring content fallback.
//!
//! When no usable profile exists (or its selectors come up empty) the
//! engine scores every paragraph by text density, credits the score to
//! the paragraph's parent container, and takes the highest-scoring
//! container as the article body. Runs entirely on a cloned document;
//! the caller's DOM is never touched.

use crate::article::{ArticleRecord, ExtractionSource, excerpt_of};
use crate::metadata;
use crate::sanitize;
use dom_query::{Document, NodeId, Selection};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Minimum paragraph length (characters) to count as a candidate.
const MIN_PARAGRAPH_LENGTH: usize = 50;

/// Penalty for containers that look like page chrome.
const CHROME_PENALTY: f64 = 5.0;

/// Fallback text length gate for the conventional-selector pass.
const FALLBACK_MIN_LENGTH: usize = 500;

/// Ad-like elements are only removed when their own text is shorter
/// than this; long text that merely mentions "sponsored" is content.
const AD_TEXT_MAX_LENGTH: usize = 200;

const NOISE_TAGS: &str = "script, style, noscript, iframe, object, embed, nav, header, footer, aside";

const AD_ATTR_SELECTORS: &str = r#"[class*="ad"], [id*="ad"], [class*="social"], [class*="share"], [class*="newsletter"], [class*="subscribe"], [class*="popup"], [class*="modal"], [class*="overlay"]"#;

const FALLBACK_SELECTORS: &[&str] = &["article", ".post", ".entry", ".content", "#content", "main", ".main"];

const CLEAN_SELECTORS: &str = ".advertisement, .ad, .ads, .sponsored, .promo, .social-share, .share-buttons, .newsletter, .subscribe, .popup, .modal, .overlay, .sidebar, .related-articles, [data-ad], [data-advertisement]";

static AD_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)advertisement|sponsored|promo|banner|popup").unwrap());
static CHROME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)comment|meta|footer|sidebar").unwrap());

/// Extract an article from `doc` with no site profile.
///
/// Metadata is read from the original document; content selection
/// happens on a clone so the pre-pass removals don't leak out.
pub fn extract_heuristically(doc: &Document, url: &Url) -> Option<ArticleRecord> {
    let page = metadata::page_metadata(doc);

    let work = Document::from(doc.html().to_string());
    remove_noise(&work);

    let content = match best_container(&work) {
        Some(node_id) => container_content(&work, node_id),
        None => fallback_content(&work),
    };

    let text = sanitize::text_of_fragment(&content);
    if text.is_empty() {
        debug!("heuristic found no non-empty container");
        return None;
    }

    Some(ArticleRecord {
        title: page.title.unwrap_or_else(|| metadata::title_from_url(url)),
        byline: page.byline,
        site_name: page.site_name.or_else(|| metadata::site_name_from_url(url)),
        excerpt: excerpt_of(&text),
        length: text.chars().count(),
        content,
        text_content: text,
        url: url.to_string(),
        published_time: page.published_time,
        lang: page.lang,
        source: ExtractionSource::Heuristic,
    })
}

/// Pre-pass: obvious non-content tags, ad-flavored class/id values,
/// then short elements whose combined text and attributes read like an
/// ad.
fn remove_noise(doc: &Document) {
    doc.select(NOISE_TAGS).remove();
    doc.select(AD_ATTR_SELECTORS).remove();

    for node in doc.select("body *").nodes() {
        let sel = Selection::from(*node);
        let text = sel.text();
        let class = sel.attr("class").map(|v| v.to_string()).unwrap_or_default();
        let id = sel.attr("id").map(|v| v.to_string()).unwrap_or_default();
        let combined = format!("{} {} {}", text, class, id);
        if AD_TEXT_RE.is_match(&combined) && text.trim().chars().count() < AD_TEXT_MAX_LENGTH {
            sel.remove();
        }
    }
}

/// Score paragraphs and credit their parents; the best-scoring parent
/// in encounter order wins (strictly-greater comparison keeps ties
/// stable).
fn best_container(doc: &Document) -> Option<NodeId> {
    let mut scores: HashMap<NodeId, f64> = HashMap::new();
    let mut order: Vec<NodeId> = Vec::new();

    for p_node in doc.select("p").nodes() {
        let Some(parent) = p_node.parent() else { continue };
        if parent.node_name().is_none_or(|n| n.to_lowercase() == "blockquote") {
            continue;
        }

        let p_sel = Selection::from(*p_node);
        let text = p_sel.text();
        let length = text.trim().chars().count();
        if length < MIN_PARAGRAPH_LENGTH {
            continue;
        }

        let mut score = length as f64 / 100.0;
        score += 1.0; // paragraph tag bonus

        let parent_sel = Selection::from(parent);
        if is_chrome(&p_sel) || is_chrome(&parent_sel) {
            score -= CHROME_PENALTY;
        }
        if score <= 0.0 {
            continue;
        }

        let entry = scores.entry(parent.id).or_insert_with(|| {
            order.push(parent.id);
            0.0
        });
        *entry += score;
    }

    let mut best: Option<(NodeId, f64)> = None;
    for id in order {
        let score = scores[&id];
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((id, score));
        }
    }
    best.map(|(id, _)| id)
}

fn is_chrome(sel: &Selection) -> bool {
    let class = sel.attr("class").map(|v| v.to_string()).unwrap_or_default();
    let id = sel.attr("id").map(|v| v.to_string()).unwrap_or_default();
    CHROME_RE.is_match(&format!("{} {}", class, id))
}

/// Markup of the chosen container after the clean pass.
fn container_content(doc: &Document, node_id: NodeId) -> String {
    let Some(node) = find_by_id(doc, node_id) else {
        return fallback_content(doc);
    };
    clean_node(&node);
    node.inner_html().trim().to_string()
}

/// Re-locate a scored container by node id.
fn find_by_id(doc: &Document, node_id: NodeId) -> Option<Selection<'_>> {
    doc.select("*").nodes().iter().find(|node| node.id == node_id).map(|node| Selection::from(*node))
}

/// Conventional content selectors, then the whole body.
fn fallback_content(doc: &Document) -> String {
    for css in FALLBACK_SELECTORS {
        let sel = doc.select(css);
        if sel.exists() && sel.text().trim().chars().count() > FALLBACK_MIN_LENGTH {
            debug!(selector = css, "heuristic fell back to conventional selector");
            clean_node(&sel);
            return sel.inner_html().trim().to_string();
        }
    }
    let body = doc.select("body");
    clean_node(&body);
    body.inner_html().trim().to_string()
}

/// Same clean pass for every chosen node: residual ad containers and
/// scoring bookkeeping.
fn clean_node(node: &Selection) {
    node.select(CLEAN_SELECTORS).remove();
    node.select("[data-candidate]").remove_attr("data-candidate");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<ArticleRecord> {
        let doc = Document::from(html);
        let url = Url::parse("https://example.com/post").unwrap();
        extract_heuristically(&doc, &url)
    }

    fn para(len: usize) -> String {
        "word ".repeat(len / 5)
    }

    #[test]
    fn test_dense_container_wins() {
        let body = para(400);
        let html = format!(
            r#"<html><head><title>T</title></head><body>
              <div id="story"><p>{body}</p><p>{body}</p></div>
              <div><p>{short}</p></div>
            </body></html>"#,
            short = para(60),
        );
        let record = extract(&html).unwrap();
        assert_eq!(record.source, ExtractionSource::Heuristic);
        assert!(record.length > 500);
        assert!(record.text_content.starts_with("word"));
    }

    #[test]
    fn test_penalized_container_loses_to_plain_div() {
        let body = para(300);
        let html = format!(
            r#"<html><body>
              <div class="comments"><p>{body}</p></div>
              <div><p>{body}</p></div>
            </body></html>"#
        );
        let doc = Document::from(html);
        remove_noise(&doc);
        let winner = best_container(&doc).unwrap();
        let sel = find_by_id(&doc, winner).unwrap();
        assert_ne!(sel.attr("class").as_deref(), Some("comments"));
    }

    #[test]
    fn test_short_paragraphs_are_not_candidates() {
        let html = format!(
            "<html><body><div><p>{}</p></div></body></html>",
            "tiny text under fifty"
        );
        let doc = Document::from(html);
        assert!(best_container(&doc).is_none());
    }

    #[test]
    fn test_blockquote_parent_skipped() {
        let body = para(300);
        let html = format!("<html><body><blockquote><p>{body}</p></blockquote></body></html>");
        let doc = Document::from(html);
        assert!(best_container(&doc).is_none());
    }

    #[test]
    fn test_long_sponsored_text_survives_prepass() {
        let mut long_ad_mention = String::from("This piece is not sponsored by anyone. ");
        while long_ad_mention.chars().count() < 500 {
            long_ad_mention.push_str("More perfectly legitimate article text here. ");
        }
        let html = format!("<html><body><div><p id=\"lede\">{long_ad_mention}</p></div></body></html>");
        let record = extract(&html).unwrap();
        assert!(record.text_content.contains("not sponsored"));
    }

    #[test]
    fn test_short_sponsored_text_removed() {
        let body = para(400);
        let html = format!(
            r#"<html><body><div>
              <p>Sponsored content from our partners</p>
              <p>{body}</p>
            </div></body></html>"#
        );
        let record = extract(&html).unwrap();
        assert!(!record.text_content.to_lowercase().contains("sponsored"));
    }

    #[test]
    fn test_fallback_selector_needs_500_chars() {
        let long = para(600);
        let html = format!(r#"<html><body><article>{long}</article></body></html>"#);
        // No <p> candidates: article text is bare.
        let record = extract(&html).unwrap();
        assert!(record.text_content.contains("word"));
    }

    #[test]
    fn test_body_last_resort() {
        let html = "<html><head><title>T</title></head><body>just a little loose text</body></html>";
        let record = extract(html).unwrap();
        assert_eq!(record.text_content, "just a little loose text");
    }

    #[test]
    fn test_empty_page_yields_none() {
        assert!(extract("<html><body></body></html>").is_none());
    }

    #[test]
    fn test_metadata_read_before_prepass_removals() {
        let body = para(400);
        let html = format!(
            r#"<html lang="de"><head><title>Kurz</title>
               <meta name="author" content="A. Writer"></head>
               <body><header>site chrome</header><div><p>{body}</p></div></body></html>"#
        );
        let record = extract(&html).unwrap();
        assert_eq!(record.byline.as_deref(), Some("A. Writer"));
        assert_eq!(record.lang.as_deref(), Some("de"));
        assert!(!record.text_content.contains("site chrome"));
    }
}
