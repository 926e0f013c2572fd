pub mod article;
pub mod error;
pub mod extract;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod heuristic;
pub mod jsonld;
pub mod metadata;
pub mod pagination;
pub mod sanitize;
pub mod selector;
pub mod siteconfig;

pub use article::{ArticleRecord, EXCERPT_LENGTH, ExtractionSource, excerpt_of};
pub use error::{ExtractError, Result};
pub use extract::Extractor;
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, HttpFetcher};
pub use heuristic::extract_heuristically;
pub use jsonld::try_structured_data;
pub use metadata::{PageMetadata, page_metadata};
pub use pagination::{
    MAX_PAGINATION_PAGES, PAGE_BREAK, PageFetcher, PaginationConfig, merge_pages,
    resolve_single_page,
};
pub use sanitize::{CleanedContent, sanitize_fragment};
#[doc(hidden)]
pub use selector::{CompiledSelector, compile, select_nodes, select_string};
pub use siteconfig::{
    Clock, DirProfileSource, DirectiveKind, EmptyProfileSource, PROFILE_TTL, ParseDiagnostic,
    ParsedProfile, ProfileSource, ProfileStore, RuleSet, SystemClock, parse_str,
};
