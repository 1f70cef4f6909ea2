//! Rules — ordered phrase tables that drive section detection.
//!
//! Each table is a list of `(kind, pattern)` pairs evaluated top to bottom;
//! the first match wins. Apply rules are listed before plan rules so that a
//! message mentioning both operations resolves to apply.

use regex::Regex;
use std::sync::LazyLock;

use super::model::SectionKind;

pub struct Rule {
    pub kind: SectionKind,
    pub name: &'static str,
    pattern: Regex,
}

impl Rule {
    fn new(kind: SectionKind, name: &'static str, pattern: &str) -> Self {
        Self {
            kind,
            name,
            pattern: Regex::new(pattern).expect("valid section rule pattern"),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Keyword families used to type a section opened by a request id.
pub static TYPE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(SectionKind::Apply, "apply keyword", r"(?i)\bapply\b"),
        Rule::new(SectionKind::Plan, "plan keyword", r"(?i)\bplan\b"),
        Rule::new(SectionKind::Plan, "plan summary", r"(?i)\bto add\b"),
    ]
});

/// Phrases that open an anonymous section.
///
/// `Apply complete!` deliberately matches none of these.
pub static START_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(SectionKind::Apply, "cli args", r"(?i)\bCLI (?:command )?args\b.*\bapply\b"),
        Rule::new(SectionKind::Apply, "command line", r"(?i)\bterraform\s+apply\b"),
        Rule::new(
            SectionKind::Apply,
            "operation start",
            r"(?i)\b(?:starting|running|beginning)\s+(?:terraform\s+)?apply\b",
        ),
        Rule::new(SectionKind::Plan, "cli args", r"(?i)\bCLI (?:command )?args\b.*\bplan\b"),
        Rule::new(SectionKind::Plan, "command line", r"(?i)\bterraform\s+plan\b"),
        Rule::new(
            SectionKind::Plan,
            "operation start",
            r"(?i)\b(?:starting|running|beginning)\s+(?:terraform\s+)?plan\b",
        ),
    ]
});

/// Phrases that close a section of the given kind.
pub static END_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(SectionKind::Apply, "apply complete", r"(?i)\bapply (?:complete|finished)\b"),
        Rule::new(SectionKind::Plan, "plan summary", r"(?i)\bplan:\s*\d+ to add\b"),
        Rule::new(SectionKind::Plan, "change count", r"(?i)\b\d+ to (?:change|destroy)\b"),
        Rule::new(SectionKind::Plan, "no changes", r"(?i)\bno changes\b"),
    ]
});

fn first_match<'a>(rules: &'a [Rule], text: &str) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.is_match(text))
}

/// Keyword family of a message, if any.
pub fn classify(text: &str) -> Option<SectionKind> {
    first_match(&TYPE_RULES, text).map(|rule| rule.kind)
}

/// Kind of section this message opens, if it opens one.
pub fn start_kind(text: &str) -> Option<SectionKind> {
    first_match(&START_RULES, text).map(|rule| rule.kind)
}

/// Kind of section this message closes, if it closes one.
pub fn end_kind(text: &str) -> Option<SectionKind> {
    first_match(&END_RULES, text).map(|rule| rule.kind)
}

/// Whether this message closes a section of `kind`.
pub fn is_end_for(text: &str, kind: SectionKind) -> bool {
    END_RULES
        .iter()
        .any(|rule| rule.kind == kind && rule.is_match(text))
}
