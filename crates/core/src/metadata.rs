//! Page-level metadata reads.
//!
//! Every strategy fills the gaps in its record from the same
//! document-level sources: `<title>`, Open Graph tags, author and date
//! metas, and the root `lang` attribute. Selector misses are normal
//! and produce `None`.

use dom_query::Document;
use url::Url;

/// Metadata harvested from the page head and root element.
#[derive(Debug, Clone, Default)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub site_name: Option<String>,
    pub published_time: Option<String>,
    pub lang: Option<String>,
}

/// Harvest all page-level metadata in one pass.
pub fn page_metadata(doc: &Document) -> PageMetadata {
    PageMetadata {
        title: best_title(doc),
        byline: byline(doc),
        site_name: meta_content(doc, "meta[property=\"og:site_name\"]"),
        published_time: published_time(doc),
        lang: doc.select("html").attr("lang").map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
    }
}

/// The page title, preferring a substantial `<h1>` over the `<title>`
/// element. Page titles often carry ` | Site Name` suffixes; an h1 at
/// least half the title's length is the cleaner headline.
pub fn best_title(doc: &Document) -> Option<String> {
    let doc_title = first_text(doc, "title").or_else(|| meta_content(doc, "meta[property=\"og:title\"]"));

    if let Some(h1) = first_text(doc, "h1") {
        match &doc_title {
            Some(title) if h1.chars().count() * 2 > title.chars().count() => return Some(h1),
            None => return Some(h1),
            Some(_) => {}
        }
    }
    doc_title
}

fn byline(doc: &Document) -> Option<String> {
    meta_content(doc, "meta[name=\"author\"]")
        .or_else(|| meta_content(doc, "meta[property=\"article:author\"]"))
}

fn published_time(doc: &Document) -> Option<String> {
    meta_content(doc, "meta[property=\"article:published_time\"]")
        .or_else(|| meta_content(doc, "meta[name=\"date\"]"))
        .or_else(|| {
            doc.select("time[datetime]")
                .attr("datetime")
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
        })
}

/// `content` attribute of the first matching meta tag, trimmed,
/// filtered to non-empty.
fn meta_content(doc: &Document, css: &str) -> Option<String> {
    doc.select(css).attr("content").map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Trimmed text of the first matching element.
fn first_text(doc: &Document, css: &str) -> Option<String> {
    let sel = doc.select(css);
    if !sel.exists() {
        return None;
    }
    let text = sel.text();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Last-resort title derived from the URL path.
pub fn title_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let stem = segment.rsplit_once('.').map_or(segment, |(stem, _)| stem);
            stem.replace(['-', '_'], " ")
        })
        .unwrap_or_else(|| url.host_str().unwrap_or("Untitled").to_string())
}

/// Site name derived from the URL host.
pub fn site_name_from_url(url: &Url) -> Option<String> {
    url.host_str().map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html lang="en">
      <head>
        <title>A Story | Example Times</title>
        <meta property="og:title" content="A Story">
        <meta property="og:site_name" content="Example Times">
        <meta name="author" content="Jane Roe">
        <meta property="article:published_time" content="2024-03-01T09:00:00Z">
      </head>
      <body><h1>A Story About Everything</h1><p>body</p></body>
    </html>"#;

    #[test]
    fn test_page_metadata_reads_head() {
        let doc = Document::from(PAGE);
        let meta = page_metadata(&doc);
        assert_eq!(meta.byline.as_deref(), Some("Jane Roe"));
        assert_eq!(meta.site_name.as_deref(), Some("Example Times"));
        assert_eq!(meta.published_time.as_deref(), Some("2024-03-01T09:00:00Z"));
        assert_eq!(meta.lang.as_deref(), Some("en"));
    }

    #[test]
    fn test_substantial_h1_overrides_title() {
        let doc = Document::from(PAGE);
        assert_eq!(best_title(&doc).as_deref(), Some("A Story About Everything"));
    }

    #[test]
    fn test_short_h1_does_not_override() {
        let doc = Document::from(
            "<html><head><title>A Very Long and Specific Article Title</title></head><body><h1>Blog</h1></body></html>",
        );
        assert_eq!(best_title(&doc).as_deref(), Some("A Very Long and Specific Article Title"));
    }

    #[test]
    fn test_time_element_fallback() {
        let doc = Document::from(r#"<article><time datetime="2023-07-04">July 4</time></article>"#);
        assert_eq!(page_metadata(&doc).published_time.as_deref(), Some("2023-07-04"));
    }

    #[test]
    fn test_title_from_url_slug() {
        let url = Url::parse("https://example.com/2024/03/some-article-slug.html").unwrap();
        assert_eq!(title_from_url(&url), "some article slug");
    }

    #[test]
    fn test_site_name_from_url_strips_www() {
        let url = Url::parse("https://www.example.com/a").unwrap();
        assert_eq!(site_name_from_url(&url).as_deref(), Some("example.com"));
    }
}
