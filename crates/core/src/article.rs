//! Article record type produced by the extraction engine.
//!
//! [`ArticleRecord`] is the single output of every extraction strategy.
//! Downstream consumers (e-reader packagers, reference-manager
//! uploaders) accept it verbatim and never need to know which strategy
//! produced it; [`ExtractionSource`] is informational only.

use serde::Serialize;

/// Maximum excerpt length in characters.
pub const EXCERPT_LENGTH: usize = 300;

/// Which extraction strategy produced an [`ArticleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtractionSource {
    /// Embedded linked-data article object.
    #[serde(rename = "json-ld")]
    JsonLd,
    /// Declarative per-site profile.
    #[serde(rename = "site-config")]
    SiteConfig,
    /// Generic density-scoring fallback.
    #[serde(rename = "heuristic")]
    Heuristic,
}

impl std::fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionSource::JsonLd => write!(f, "json-ld"),
            ExtractionSource::SiteConfig => write!(f, "site-config"),
            ExtractionSource::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// The complete result of extracting one article.
///
/// `content` and `text_content` are always derived from the same final
/// node; they are never mixed across strategies. The record is
/// immutable after creation and ownership passes to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleRecord {
    /// Article title.
    pub title: String,

    /// Author byline, when one could be determined.
    pub byline: Option<String>,

    /// Publishing site name.
    pub site_name: Option<String>,

    /// Extracted content as cleaned HTML markup.
    pub content: String,

    /// Plain text version of `content`.
    pub text_content: String,

    /// Length of `text_content` in characters.
    pub length: usize,

    /// Short excerpt of the article text.
    pub excerpt: String,

    /// Source URL of the article.
    pub url: String,

    /// Publication timestamp as found on the page, if any.
    pub published_time: Option<String>,

    /// Article language tag.
    pub lang: Option<String>,

    /// Strategy that produced this record.
    pub source: ExtractionSource,
}

impl ArticleRecord {
    /// Recompute text-derived fields after the content markup changed
    /// (used when pagination merging extends the body).
    pub(crate) fn replace_content(&mut self, content: String, text_content: String) {
        self.length = text_content.chars().count();
        self.excerpt = excerpt_of(&text_content);
        self.content = content;
        self.text_content = text_content;
    }
}

/// First [`EXCERPT_LENGTH`] characters of `text`, with a trailing
/// ellipsis marker when truncated.
pub fn excerpt_of(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= EXCERPT_LENGTH {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(EXCERPT_LENGTH).collect();
        format!("{}...", cut)
    }
}
