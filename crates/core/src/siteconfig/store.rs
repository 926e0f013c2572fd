//! Profile resolution, caching, and builtin profiles.
//!
//! [`ProfileStore`] answers "which rule set applies to this hostname?"
//! It consults a small set of builtin profiles first, then a pluggable
//! [`ProfileSource`] (normally a directory of FTR-format `.txt` files),
//! and caches every answer, misses included, for [`PROFILE_TTL`].
//!
//! Hostnames are matched exactly and by suffix wildcard: a request for
//! `blog.example.com` also tries `.example.com`. Exact and wildcard
//! profiles are distinct entries in the backing store (`example.com.txt`
//! versus `.example.com.txt`), so a profile written for the apex never
//! leaks to subdomains. A wildcard hit registers the concrete hostname
//! as an extra cache key pointing at the same shared rule set, so
//! subdomains never hold copies.

use super::directives::RuleSet;
use super::parser;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a resolved (or failed) profile lookup stays cached.
pub const PROFILE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const THEATLANTIC_PROFILE: &str = "\
# theatlantic.com
title: //meta[@property='og:title']/@content
title: //h1[@class='ArticleHeader_headline__B8PsX']
title: //h1
body: //article[@id='main-article']
body: //div[@id='main-article']
body: //div[@class='ArticleBody_root__2jqPc']
body: //div[@itemprop='articleBody']
body: //div[@class='articleText']
author: //meta[@name='author']/@content
author: //div[@class='AttributionDetails_author__1uPE-']//a
strip: //nav
strip: //header[@class='SiteHeader_root__1-QhY']
strip: //div[contains(@class, 'Advertisement')]
strip: //div[contains(@class, 'Share')]
strip: //div[contains(@class, 'Newsletter')]
";

const SUBSTACK_PROFILE: &str = "\
# substack.com (and every *.substack.com publication)
title: //meta[@property='og:title']/@content
title: //h1[@class='post-title']
body: //div[@class='available-content']
body: //div[@class='body markup']
author: //meta[@name='author']/@content
author: //a[@class='publication-logo']
strip: //div[contains(@class, 'subscription')]
strip: //div[contains(@class, 'paywall')]
strip: //button
strip: //svg
";

const NEWYORKER_PROFILE: &str = "\
# newyorker.com
# Full article text ships in the page's linked data.
prefer_structured_data: yes
title: //meta[@property='og:title']/@content
title: //h1
body: //div[@data-testid='ArticleBodyWrapper']
body: //article//div[@class='GridItem']
author: //meta[@name='author']/@content
author: //span[@class='byline-name']//a
";

/// Backing storage for site profiles. Keys are either a bare hostname
/// or a dot-prefixed suffix wildcard (`.example.com`); the two name
/// different profiles.
pub trait ProfileSource: Send + Sync {
    /// Load the profile text for `host`, or `None` when the source has
    /// no profile for it.
    fn load(&self, host: &str) -> io::Result<Option<String>>;
}

/// Time source, injectable so TTL expiry is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Profile source reading FTR `.txt` files from one directory. Exact
/// profiles live in `example.com.txt`, wildcard profiles in
/// `.example.com.txt`.
#[derive(Debug)]
pub struct DirProfileSource {
    dir: PathBuf,
}

impl DirProfileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Conventional profile directory under the user's config dir.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("inkpress").join("site-config"))
    }
}

impl ProfileSource for DirProfileSource {
    fn load(&self, host: &str) -> io::Result<Option<String>> {
        // Hostnames come pre-normalized; anything with a path
        // separator is not a hostname.
        if host.contains('/') || host.contains('\\') {
            return Ok(None);
        }
        let path = self.dir.join(format!("{host}.txt"));
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// A source with no profiles, for purely builtin/heuristic operation.
#[derive(Debug, Default)]
pub struct EmptyProfileSource;

impl ProfileSource for EmptyProfileSource {
    fn load(&self, _host: &str) -> io::Result<Option<String>> {
        Ok(None)
    }
}

/// One cached lookup. `rules: None` is a cached miss.
struct CacheEntry {
    rules: Option<Arc<RuleSet>>,
    resolved_at: Instant,
}

/// Resolves and caches site profiles by hostname.
pub struct ProfileStore {
    source: Box<dyn ProfileSource>,
    builtins: HashMap<&'static str, &'static str>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    clock: Box<dyn Clock>,
    ttl: Duration,
}

impl ProfileStore {
    pub fn new(source: impl ProfileSource + 'static) -> Self {
        Self::with_clock(source, SystemClock)
    }

    pub fn with_clock(source: impl ProfileSource + 'static, clock: impl Clock + 'static) -> Self {
        let mut builtins = HashMap::new();
        builtins.insert("theatlantic.com", THEATLANTIC_PROFILE);
        builtins.insert("substack.com", SUBSTACK_PROFILE);
        builtins.insert("newyorker.com", NEWYORKER_PROFILE);
        Self {
            source: Box::new(source),
            builtins,
            cache: Mutex::new(HashMap::new()),
            clock: Box::new(clock),
            ttl: PROFILE_TTL,
        }
    }

    /// Resolve the rule set for a hostname.
    ///
    /// Returns `None` when no usable profile exists, which callers
    /// treat as "run the other strategies", never as an error.
    pub fn resolve(&self, hostname: &str) -> Option<Arc<RuleSet>> {
        let host = normalize_host(hostname);
        if host.is_empty() {
            return None;
        }
        let now = self.clock.now();
        let candidates = candidate_keys(&host);

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        for key in &candidates {
            if let Some(entry) = cache.get(key) {
                if now.duration_since(entry.resolved_at) < self.ttl {
                    let rules = entry.rules.clone();
                    let resolved_at = entry.resolved_at;
                    if key != &host {
                        // Subdomains of a wildcard share the entry.
                        cache.insert(host.clone(), CacheEntry { rules: rules.clone(), resolved_at });
                    }
                    return rules;
                }
                cache.remove(key);
            }
        }

        for key in &candidates {
            if let Some(text) = self.profile_text(key) {
                let parsed = parser::parse_str(&text);
                for diag in &parsed.diagnostics {
                    debug!(profile = key.as_str(), line = diag.line, "profile diagnostic: {}", diag.message);
                }
                let rules = parsed.usable_rules().map(Arc::new);
                if rules.is_none() {
                    debug!(profile = key.as_str(), "profile exists but is not usable");
                }
                let entry = CacheEntry { rules: rules.clone(), resolved_at: now };
                if key != &host {
                    cache.insert(host.clone(), CacheEntry { rules: rules.clone(), resolved_at: now });
                }
                cache.insert(key.clone(), entry);
                return rules;
            }
        }

        // Cache the miss so repeated lookups stay cheap.
        cache.insert(host, CacheEntry { rules: None, resolved_at: now });
        None
    }

    /// Warm the cache for a set of hostnames. Failures are swallowed;
    /// preloading is best-effort.
    pub fn preload<'a>(&self, hostnames: impl IntoIterator<Item = &'a str>) {
        for hostname in hostnames {
            let _ = self.resolve(hostname);
        }
    }

    /// Profile text for a cache key. Builtins are keyed by bare
    /// hostname and cover subdomains; the backing source sees the key
    /// verbatim, dot and all, so exact and wildcard profiles stay
    /// distinct.
    fn profile_text(&self, key: &str) -> Option<String> {
        let builtin_key = key.strip_prefix('.').unwrap_or(key);
        if let Some(text) = self.builtins.get(builtin_key) {
            return Some((*text).to_string());
        }
        match self.source.load(key) {
            Ok(text) => text,
            Err(err) => {
                warn!(key, "profile source error: {err}");
                None
            }
        }
    }
}

/// Lowercase and drop a leading `www.`.
fn normalize_host(hostname: &str) -> String {
    let host = hostname.trim().to_ascii_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// The exact hostname, then each suffix wildcard with at least two
/// labels: `a.b.example.com` → `[a.b.example.com, .b.example.com,
/// .example.com]`.
fn candidate_keys(host: &str) -> Vec<String> {
    let mut keys = vec![host.to_string()];
    let labels: Vec<&str> = host.split('.').collect();
    for start in 1..labels.len().saturating_sub(1) {
        keys.push(format!(".{}", labels[start..].join(".")));
    }
    keys
}
