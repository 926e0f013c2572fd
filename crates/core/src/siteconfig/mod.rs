//! Declarative per-site extraction profiles.
//!
//! A profile tells the extractor exactly where a site keeps its title,
//! body, author, and date, plus what to strip. Profiles are FTR-format
//! text files resolved by hostname through a caching [`ProfileStore`].

mod directives;
mod parser;
mod store;

pub use directives::{DirectiveKind, RuleSet};
pub use parser::{ParseDiagnostic, ParsedProfile, parse_str};
pub use store::{
    Clock, DirProfileSource, EmptyProfileSource, PROFILE_TTL, ProfileSource, ProfileStore,
    SystemClock,
};
