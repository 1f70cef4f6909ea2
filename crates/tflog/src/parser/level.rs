//! Level — severity canonicalization.

use super::patterns::SEVERITY_KEYWORD;

/// Canonical severity tokens, lowest first.
pub const KNOWN_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "ERROR", "CRITICAL"];

/// Outcome of canonicalizing a level value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalLevel {
    Known(&'static str),
    /// Unrecognized token, kept uppercased so rare levels stay visible
    Passthrough(String),
}

impl CanonicalLevel {
    pub fn into_string(self) -> String {
        match self {
            CanonicalLevel::Known(level) => level.to_string(),
            CanonicalLevel::Passthrough(level) => level,
        }
    }
}

/// Canonicalize a level taken from a payload key.
///
/// A recognized keyword anywhere in the value wins (`"[ERROR]"` → `ERROR`);
/// otherwise the trimmed value is passed through uppercased. Blank input
/// yields `None`.
pub fn canonicalize(raw: &str) -> Option<CanonicalLevel> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(match find_keyword(trimmed) {
        Some(level) => CanonicalLevel::Known(level),
        None => CanonicalLevel::Passthrough(trimmed.to_uppercase()),
    })
}

/// Search free text for a bare severity keyword.
pub fn find_in_text(text: &str) -> Option<&'static str> {
    find_keyword(text)
}

/// Sort rank: known levels by severity, unknown after them.
pub fn rank(level: &str) -> usize {
    KNOWN_LEVELS
        .iter()
        .position(|known| known.eq_ignore_ascii_case(level))
        .unwrap_or(KNOWN_LEVELS.len())
}

fn find_keyword(text: &str) -> Option<&'static str> {
    let caps = SEVERITY_KEYWORD.captures(text)?;
    let word = caps.get(1)?.as_str().to_ascii_lowercase();
    match word.as_str() {
        "trace" => Some("TRACE"),
        "debug" => Some("DEBUG"),
        "info" => Some("INFO"),
        "warn" | "warning" => Some("WARN"),
        "error" => Some("ERROR"),
        "critical" => Some("CRITICAL"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_levels_case_insensitive() {
        assert_eq!(canonicalize("info"), Some(CanonicalLevel::Known("INFO")));
        assert_eq!(canonicalize("Error"), Some(CanonicalLevel::Known("ERROR")));
        assert_eq!(canonicalize(" [WARN] "), Some(CanonicalLevel::Known("WARN")));
        assert_eq!(canonicalize("warning"), Some(CanonicalLevel::Known("WARN")));
    }

    #[test]
    fn test_unknown_level_passes_through() {
        assert_eq!(
            canonicalize("fatal"),
            Some(CanonicalLevel::Passthrough("FATAL".to_string()))
        );
        assert_eq!(canonicalize("   "), None);
    }

    #[test]
    fn test_find_in_text() {
        assert_eq!(find_in_text("2024/01/15 10:00:00 [DEBUG] provider: starting"), Some("DEBUG"));
        assert_eq!(find_in_text("nothing to see"), None);
    }

    #[test]
    fn test_rank_orders_by_severity() {
        assert!(rank("TRACE") < rank("DEBUG"));
        assert!(rank("warn") < rank("ERROR"));
        assert!(rank("CRITICAL") < rank("FATAL"));
    }
}
