//! Line-oriented site profile parser.
//!
//! Profiles use the FTR text format: one `name: value` directive per
//! line, `#` comments, blank lines ignored. Parsing never fails: a
//! malformed or unknown line becomes a [`ParseDiagnostic`] and the rest
//! of the profile still applies.

use super::directives::{DirectiveKind, RuleSet};
use tracing::debug;

/// One non-fatal problem found while parsing a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// 1-based line number within the profile text.
    pub line: usize,
    /// Human-readable description of the problem.
    pub message: String,
}

/// Result of parsing one profile text.
#[derive(Debug, Clone, Default)]
pub struct ParsedProfile {
    /// All directives that parsed, in file order.
    pub rules: RuleSet,
    /// Problems encountered on the way.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParsedProfile {
    /// The rule set, but only when it can stand alone as an extraction
    /// strategy (locates both a title and a body).
    pub fn usable_rules(self) -> Option<RuleSet> {
        if self.rules.is_usable() { Some(self.rules) } else { None }
    }
}

/// Parse a profile from its text form.
pub fn parse_str(text: &str) -> ParsedProfile {
    let mut profile = ParsedProfile::default();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            profile.diagnostics.push(ParseDiagnostic {
                line: line_no,
                message: format!("missing ':' separator: {line}"),
            });
            continue;
        };
        let name = name.trim();
        let value = value.trim();

        // Empty values carry no information; FTR files use them as
        // placeholders.
        if value.is_empty() {
            continue;
        }

        // replace_string(find): replacement bundles both halves of a pair.
        if let Some(find) = name.strip_prefix("replace_string(").and_then(|rest| rest.strip_suffix(')')) {
            profile.rules.add_replacement(find, value);
            continue;
        }

        match DirectiveKind::from_name(name) {
            Some(kind) => profile.rules.add_directive(kind, value),
            // `parser:` names the upstream HTML parser; selection is
            // not configurable here.
            None if name == "parser" => {}
            None => {
                debug!(line = line_no, directive = name, "unknown profile directive");
                profile.diagnostics.push(ParseDiagnostic {
                    line: line_no,
                    message: format!("unknown directive: {name}"),
                });
            }
        }
    }

    profile
}
