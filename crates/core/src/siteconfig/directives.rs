//! Site profile rule sets.
//!
//! A [`RuleSet`] is the in-memory form of one declarative site profile:
//! ordered selector lists per extraction concern, two tri-state
//! sanitizer switches, and string replacements applied to the raw HTML
//! before parsing. Profiles accumulate directives in file order via
//! [`RuleSet::add_directive`].

/// Directive names accepted in a site profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Title selector.
    Title,
    /// Body content selector.
    Body,
    /// Author selector.
    Author,
    /// Publication date selector.
    Date,
    /// Selector for nodes to remove from the body.
    Strip,
    /// Substring matched against class and id attributes of nodes to remove.
    StripIdOrClass,
    /// Substring matched against `src` of images to remove.
    StripImageSrc,
    /// Enable or disable structural pruning of the body.
    Prune,
    /// Enable or disable whitespace tidying of the body.
    Tidy,
    /// Selector for the link to the next page of a paginated article.
    NextPageLink,
    /// Selector for the link to a single-page view of the article.
    SinglePageLink,
    /// Literal string to locate in the raw HTML, paired with the next
    /// `replace_string`.
    FindString,
    /// Replacement text for the paired `find_string`.
    ReplaceString,
    /// Try structured-data extraction before this profile's selectors.
    PreferStructuredData,
}

impl DirectiveKind {
    /// Look up a directive by its profile-file name. The parenthesized
    /// `replace_string(...)` form is handled by the parser, not here.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "body" => Some(Self::Body),
            "author" => Some(Self::Author),
            "date" => Some(Self::Date),
            "strip" => Some(Self::Strip),
            "strip_id_or_class" => Some(Self::StripIdOrClass),
            "strip_image_src" => Some(Self::StripImageSrc),
            "prune" => Some(Self::Prune),
            "tidy" => Some(Self::Tidy),
            "next_page_link" => Some(Self::NextPageLink),
            "single_page_link" => Some(Self::SinglePageLink),
            "find_string" => Some(Self::FindString),
            "replace_string" => Some(Self::ReplaceString),
            "prefer_structured_data" => Some(Self::PreferStructuredData),
            _ => None,
        }
    }
}

/// Parsed directives of one site profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    /// Title selectors, in file order.
    pub title: Vec<String>,
    /// Body selectors, in file order.
    pub body: Vec<String>,
    /// Author selectors.
    pub author: Vec<String>,
    /// Publication date selectors.
    pub date: Vec<String>,
    /// Selectors for nodes stripped from the extracted body.
    pub strip: Vec<String>,
    /// Substrings matched against image `src` attributes.
    pub strip_image_src: Vec<String>,
    /// Next-page link selectors.
    pub next_page_link: Vec<String>,
    /// Single-page view link selectors.
    pub single_page_link: Vec<String>,
    /// Raw-HTML replacements `(find, replace)`, applied before parsing.
    pub replacements: Vec<(String, String)>,
    /// Structural pruning switch. `None` means not specified.
    pub prune: Option<bool>,
    /// Whitespace tidying switch. `None` means not specified.
    pub tidy: Option<bool>,
    /// Whether structured data should be tried before the selectors.
    pub prefer_structured_data: bool,

    /// `find_string` values awaiting their paired `replace_string`.
    pending_finds: Vec<String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one directive. `value` is the text after the colon,
    /// already trimmed and known to be non-empty.
    pub fn add_directive(&mut self, kind: DirectiveKind, value: &str) {
        let value = strip_quotes(value);
        match kind {
            DirectiveKind::Title => self.title.push(value.to_string()),
            DirectiveKind::Body => self.body.push(value.to_string()),
            DirectiveKind::Author => self.author.push(value.to_string()),
            DirectiveKind::Date => self.date.push(value.to_string()),
            DirectiveKind::Strip => self.strip.push(value.to_string()),
            DirectiveKind::StripIdOrClass => {
                // Rewritten to the strip form it is shorthand for, so
                // the sanitizer only ever walks one strip list.
                self.strip.push(format!(
                    "//*[contains(@class, '{value}') or contains(@id, '{value}')]"
                ));
            }
            DirectiveKind::StripImageSrc => self.strip_image_src.push(value.to_string()),
            DirectiveKind::Prune => self.prune = Some(parse_bool(value)),
            DirectiveKind::Tidy => self.tidy = Some(parse_bool(value)),
            DirectiveKind::NextPageLink => self.next_page_link.push(value.to_string()),
            DirectiveKind::SinglePageLink => self.single_page_link.push(value.to_string()),
            DirectiveKind::FindString => self.pending_finds.push(value.to_string()),
            DirectiveKind::ReplaceString => {
                if !self.pending_finds.is_empty() {
                    let find = self.pending_finds.remove(0);
                    self.replacements.push((find, value.to_string()));
                }
                // A replace_string with no preceding find_string is dropped.
            }
            DirectiveKind::PreferStructuredData => {
                self.prefer_structured_data = parse_bool(value);
            }
        }
    }

    /// Record a self-contained `replace_string(find): replacement` directive.
    pub fn add_replacement(&mut self, find: &str, replace: &str) {
        self.replacements.push((strip_quotes(find).to_string(), strip_quotes(replace).to_string()));
    }

    /// A profile is usable only when it can locate both a title and a
    /// body on its own. Anything less falls through to the other
    /// strategies as if no profile existed.
    pub fn is_usable(&self) -> bool {
        !self.title.is_empty() && !self.body.is_empty()
    }

    /// Pruning runs only when explicitly enabled.
    pub fn should_prune(&self) -> bool {
        self.prune == Some(true)
    }

    /// Tidying runs only when explicitly enabled.
    pub fn should_tidy(&self) -> bool {
        self.tidy == Some(true)
    }
}

/// Remove one layer of matching single or double quotes.
fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// FTR boolean values: `yes`/`true`/`1` enable, anything else disables.
fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "yes" | "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_requires_title_and_body() {
        let mut rules = RuleSet::new();
        assert!(!rules.is_usable());

        rules.add_directive(DirectiveKind::Title, "//h1");
        assert!(!rules.is_usable());

        rules.add_directive(DirectiveKind::Body, "//div[@class='post']");
        assert!(rules.is_usable());
    }

    #[test]
    fn test_strip_id_or_class_rewrites_to_strip() {
        let mut rules = RuleSet::new();
        rules.add_directive(DirectiveKind::StripIdOrClass, "'sidebar'");
        assert_eq!(rules.strip, vec!["//*[contains(@class, 'sidebar') or contains(@id, 'sidebar')]"]);
    }

    #[test]
    fn test_find_replace_pairing_in_order() {
        let mut rules = RuleSet::new();
        rules.add_directive(DirectiveKind::FindString, "<noscript>");
        rules.add_directive(DirectiveKind::FindString, "</noscript>");
        rules.add_directive(DirectiveKind::ReplaceString, "<div>");
        rules.add_directive(DirectiveKind::ReplaceString, "</div>");
        assert_eq!(
            rules.replacements,
            vec![
                ("<noscript>".to_string(), "<div>".to_string()),
                ("</noscript>".to_string(), "</div>".to_string())
            ]
        );
    }

    #[test]
    fn test_unpaired_replace_string_is_dropped() {
        let mut rules = RuleSet::new();
        rules.add_directive(DirectiveKind::ReplaceString, "<div>");
        assert!(rules.replacements.is_empty());
    }

    #[test]
    fn test_tristate_switches() {
        let mut rules = RuleSet::new();
        assert!(!rules.should_prune());
        assert!(!rules.should_tidy());

        rules.add_directive(DirectiveKind::Prune, "yes");
        rules.add_directive(DirectiveKind::Tidy, "no");
        assert!(rules.should_prune());
        assert!(!rules.should_tidy());
        assert_eq!(rules.tidy, Some(false));
    }

    #[test]
    fn test_boolean_forms() {
        for value in ["yes", "true", "1", "YES"] {
            let mut rules = RuleSet::new();
            rules.add_directive(DirectiveKind::Prune, value);
            assert!(rules.should_prune(), "{value} should enable");
        }
        for value in ["no", "false", "0", "maybe"] {
            let mut rules = RuleSet::new();
            rules.add_directive(DirectiveKind::Prune, value);
            assert!(!rules.should_prune(), "{value} should disable");
        }
    }
}
