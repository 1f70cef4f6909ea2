//! Timestamp — canonicalization plus the per-stream carry-forward resolver.
//!
//! Canonical form is RFC 3339-like: the source offset is kept when present,
//! naive inputs render without offset, and the fraction is printed only when
//! non-zero.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::patterns::{ISO_TIMESTAMP, SLASH_TIMESTAMP};
use super::{EPOCH_MILLIS_THRESHOLD, FAR_FUTURE_TIMESTAMP};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A timestamp as found in a payload, before canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampCandidate<'a> {
    Text(&'a str),
    /// Unix epoch, seconds or milliseconds
    Epoch(i64),
}

/// How the resolver arrived at a record's timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Parsed,
    CarriedForward,
    Sentinel,
}

/// Remembers the last successfully parsed timestamp of one stream.
///
/// Owned by a [`RecordNormalizer`](super::RecordNormalizer); a new normalizer
/// starts with an empty resolver so separate runs never share state.
#[derive(Debug, Default, Clone)]
pub struct TimestampResolver {
    last: Option<String>,
}

impl TimestampResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize `candidate`, falling back to the previous parsed value or
    /// the far-future sentinel. Never returns an empty string.
    pub fn resolve(&mut self, candidate: Option<TimestampCandidate<'_>>) -> (String, Resolution) {
        let parsed = match candidate {
            Some(TimestampCandidate::Text(text)) if !text.trim().is_empty() => canonicalize(text),
            Some(TimestampCandidate::Epoch(value)) => canonicalize_epoch(value),
            _ => None,
        };

        if let Some(value) = parsed {
            self.last = Some(value.clone());
            return (value, Resolution::Parsed);
        }

        match &self.last {
            Some(last) => (last.clone(), Resolution::CarriedForward),
            None => (FAR_FUTURE_TIMESTAMP.to_string(), Resolution::Sentinel),
        }
    }
}

/// Find an embedded timestamp in free text (ISO-like first, then slash form).
pub fn find_in_text(text: &str) -> Option<&str> {
    ISO_TIMESTAMP
        .find(text)
        .or_else(|| SLASH_TIMESTAMP.find(text))
        .map(|m| m.as_str())
}

/// Canonicalize a textual timestamp, or `None` when no supported form parses.
pub fn canonicalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut cleaned = trimmed.replace(',', ".");
    if cleaned.contains(' ') && !cleaned.contains('T') {
        cleaned = cleaned.replacen(' ', "T", 1);
    }

    parse_structured(&cleaned).or_else(|| parse_slash(trimmed))
}

/// Canonicalize a Unix epoch value (seconds, or milliseconds above 10^12).
pub fn canonicalize_epoch(value: i64) -> Option<String> {
    let dt = if value > EPOCH_MILLIS_THRESHOLD {
        DateTime::<Utc>::from_timestamp_millis(value)
    } else {
        DateTime::<Utc>::from_timestamp(value, 0)
    };
    dt.map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

/// Parse a canonical (or any supported) timestamp back into an instant.
/// Naive values are taken as UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let cleaned = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(cleaned, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(cleaned, NAIVE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(cleaned, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn parse_structured(s: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false));
    }
    // +0300 / +03:00 offsets without the strict RFC 3339 shape
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, NAIVE_FORMAT) {
        return Some(naive.format(NAIVE_FORMAT).to_string());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Some(naive.format(NAIVE_FORMAT).to_string());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.format(NAIVE_FORMAT).to_string())
}

fn parse_slash(raw: &str) -> Option<String> {
    let found = SLASH_TIMESTAMP.find(raw)?.as_str();
    // fraction is dropped
    let seconds = found.split([',', '.']).next().unwrap_or(found);
    NaiveDateTime::parse_from_str(seconds, "%Y/%m/%d %H:%M:%S")
        .ok()
        .map(|naive| naive.format(NAIVE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_keeps_offset() {
        assert_eq!(
            canonicalize("2025-09-09T11:05:51.089168+03:00").as_deref(),
            Some("2025-09-09T11:05:51.089168+03:00")
        );
    }

    #[test]
    fn test_canonicalize_compact_offset() {
        assert_eq!(
            canonicalize("2025-09-09T11:05:51.089168+0300").as_deref(),
            Some("2025-09-09T11:05:51.089168+03:00")
        );
    }

    #[test]
    fn test_canonicalize_zulu() {
        assert_eq!(
            canonicalize("2026-01-30T12:00:00Z").as_deref(),
            Some("2026-01-30T12:00:00+00:00")
        );
    }

    #[test]
    fn test_canonicalize_space_and_comma() {
        assert_eq!(
            canonicalize("2024-01-15 10:00:00,250").as_deref(),
            Some("2024-01-15T10:00:00.250")
        );
    }

    #[test]
    fn test_canonicalize_date_only() {
        assert_eq!(canonicalize("2024-01-15").as_deref(), Some("2024-01-15T00:00:00"));
    }

    #[test]
    fn test_canonicalize_slash_form() {
        assert_eq!(
            canonicalize("2024/01/15 10:00:00").as_deref(),
            Some("2024-01-15T10:00:00")
        );
        assert_eq!(
            canonicalize("2024/01/15 10:00:00.123").as_deref(),
            Some("2024-01-15T10:00:00")
        );
    }

    #[test]
    fn test_canonicalize_garbage() {
        assert_eq!(canonicalize("yesterday"), None);
        assert_eq!(canonicalize(""), None);
    }

    #[test]
    fn test_canonicalize_epoch() {
        assert_eq!(
            canonicalize_epoch(1_700_000_000).as_deref(),
            Some("2023-11-14T22:13:20+00:00")
        );
        assert_eq!(
            canonicalize_epoch(1_700_000_000_500).as_deref(),
            Some("2023-11-14T22:13:20.500+00:00")
        );
    }

    #[test]
    fn test_resolver_sentinel_without_history() {
        let mut resolver = TimestampResolver::new();
        let (value, how) = resolver.resolve(None);
        assert_eq!(value, FAR_FUTURE_TIMESTAMP);
        assert_eq!(how, Resolution::Sentinel);
        // the sentinel is not remembered as a real value
        assert_eq!(resolver.resolve(None).1, Resolution::Sentinel);
    }

    #[test]
    fn test_resolver_carries_forward() {
        let mut resolver = TimestampResolver::new();
        let (first, _) = resolver.resolve(Some(TimestampCandidate::Text("2024-01-15T10:00:00Z")));

        let (missing, how) = resolver.resolve(None);
        assert_eq!(missing, first);
        assert_eq!(how, Resolution::CarriedForward);

        let (garbled, how) = resolver.resolve(Some(TimestampCandidate::Text("not a time")));
        assert_eq!(garbled, first);
        assert_eq!(how, Resolution::CarriedForward);

        let (blank, _) = resolver.resolve(Some(TimestampCandidate::Text("   ")));
        assert_eq!(blank, first);
    }

    #[test]
    fn test_resolver_tracks_latest() {
        let mut resolver = TimestampResolver::new();
        resolver.resolve(Some(TimestampCandidate::Text("2024-01-15T10:00:00Z")));
        resolver.resolve(Some(TimestampCandidate::Text("2024-01-15T10:00:05Z")));
        let (value, _) = resolver.resolve(None);
        assert_eq!(value, "2024-01-15T10:00:05+00:00");
    }

    #[test]
    fn test_find_in_text_prefers_iso() {
        assert_eq!(
            find_in_text("2024/01/15 10:00:00 then 2024-01-16T00:00:00Z"),
            Some("2024-01-16T00:00:00Z")
        );
        assert_eq!(find_in_text("2024/01/15 10:00:00 [INFO]"), Some("2024/01/15 10:00:00"));
        assert_eq!(find_in_text("no time here"), None);
    }

    #[test]
    fn test_parse_instant_round_trips_sentinel() {
        let instant = parse_instant(FAR_FUTURE_TIMESTAMP).unwrap();
        assert_eq!(instant.timestamp_subsec_micros(), 999_999);
        let offset = parse_instant("2024-01-15T13:00:00+03:00").unwrap();
        assert_eq!(offset, parse_instant("2024-01-15T10:00:00Z").unwrap());
    }
}
