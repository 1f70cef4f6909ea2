//! Patterns — well-known payload keys and text patterns shared by the
//! normalizer.
//!
//! Key tables are ordered: the first present, non-empty key wins.

use regex::Regex;
use std::sync::LazyLock;

pub const TIMESTAMP_KEYS: &[&str] = &["@timestamp", "timestamp", "time", "ts", "date"];
pub const LEVEL_KEYS: &[&str] = &["@level", "level", "severity", "lvl"];
pub const MESSAGE_KEYS: &[&str] = &["@message", "message", "msg", "log"];

/// `2024-01-15T10:00:00.123+03:00`, `2024-01-15 10:00:00,5`, `...Z`
pub static ISO_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+\-]\d{2}:?\d{2})?")
        .expect("valid ISO timestamp pattern")
});

/// `2024/01/15 10:00:00` as printed by Go's `log` package.
pub static SLASH_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}(?:[.,]\d+)?")
        .expect("valid slash timestamp pattern")
});

pub static SEVERITY_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(trace|debug|info|warn|warning|error|critical)\b")
        .expect("valid severity pattern")
});

/// `vertex "aws_instance.web (expand)"`
pub static VERTEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"vertex\s+"([^"]+)""#).expect("valid vertex pattern")
});

/// Low-confidence: any `word.word` token. Matches resource addresses such as
/// `aws_vpc.main` but also file names and version numbers.
pub static DOTTED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([a-zA-Z0-9_]+\.[a-zA-Z0-9_]+)\b").expect("valid dotted token pattern")
});
