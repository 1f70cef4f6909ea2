//! Normalize — one raw payload in, one canonical record out.

use serde_json::Value;

use super::level::{self, CanonicalLevel};
use super::model::{NormalizedRecord, RawPayload};
use super::resource;
use super::stats::{RunStats, TimestampSource};
use super::timestamp::{self, TimestampCandidate, TimestampResolver};
use crate::conf::EngineConfig;

/// Per-stream record normalizer.
///
/// Owns the [`TimestampResolver`] for its stream, so one normalizer must be
/// used for exactly one ordered stream.
#[derive(Debug)]
pub struct RecordNormalizer {
    timestamp_keys: Vec<String>,
    level_keys: Vec<String>,
    message_keys: Vec<String>,
    max_fallback_message_len: usize,
    resolver: TimestampResolver,
    stats: RunStats,
}

impl RecordNormalizer {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            timestamp_keys: config.timestamp_keys.clone(),
            level_keys: config.level_keys.clone(),
            message_keys: config.message_keys.clone(),
            max_fallback_message_len: config.max_fallback_message_len,
            resolver: TimestampResolver::new(),
            stats: RunStats::new(),
        }
    }

    /// Normalize one payload. Never fails; absent fields stay `None`.
    pub fn normalize(&mut self, payload: RawPayload) -> NormalizedRecord {
        self.stats.records += 1;

        let message = extract_text(&payload, &self.message_keys)
            .or_else(|| fallback_message(&payload, self.max_fallback_message_len))
            .map(str::to_string);
        if message.is_none() {
            self.stats.missing_messages += 1;
        }

        let (candidate, source) = match extract_timestamp(&payload, &self.timestamp_keys) {
            Some(candidate) => (Some(candidate), TimestampSource::Payload),
            None => match message.as_deref().and_then(timestamp::find_in_text) {
                Some(text) => (Some(TimestampCandidate::Text(text)), TimestampSource::MessageText),
                None => (None, TimestampSource::Missing),
            },
        };
        let (timestamp, resolution) = self.resolver.resolve(candidate);
        self.stats.record_timestamp(source, resolution);

        let level = match extract_text(&payload, &self.level_keys).and_then(level::canonicalize) {
            Some(CanonicalLevel::Passthrough(raw)) => {
                self.stats.passthrough_levels += 1;
                Some(raw)
            }
            Some(known) => Some(known.into_string()),
            None => message
                .as_deref()
                .and_then(level::find_in_text)
                .map(str::to_string),
        };

        let resource = message.as_deref().and_then(resource::extract);

        tracing::trace!(
            timestamp = %timestamp,
            ?resolution,
            level = level.as_deref().unwrap_or("-"),
            resource = resource.as_ref().map(|r| r.id.as_str()).unwrap_or("-"),
            "normalized record"
        );

        NormalizedRecord {
            timestamp,
            level,
            message,
            resource,
            request_id: None,
            section: None,
            source: payload,
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn into_stats(self) -> RunStats {
        self.stats
    }
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions

/// First key in `keys` holding a non-blank string.
fn extract_text<'a>(payload: &'a RawPayload, keys: &[String]) -> Option<&'a str> {
    keys.iter().find_map(|key| match payload.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
        _ => None,
    })
}

fn extract_timestamp<'a>(payload: &'a RawPayload, keys: &[String]) -> Option<TimestampCandidate<'a>> {
    keys.iter().find_map(|key| match payload.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(TimestampCandidate::Text(s.as_str())),
        Some(Value::Number(n)) => n.as_i64().map(TimestampCandidate::Epoch),
        _ => None,
    })
}

/// First string value of reasonable length, skipping large blobs.
fn fallback_message(payload: &RawPayload, max_len: usize) -> Option<&str> {
    payload.values().find_map(|value| match value {
        Value::String(s) if !s.is_empty() && s.chars().count() < max_len => Some(s.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model::ResourceOrigin;
    use crate::parser::FAR_FUTURE_TIMESTAMP;
    use serde_json::json;

    fn payload(value: Value) -> RawPayload {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture must be an object, got {}", other),
        }
    }

    #[test]
    fn test_terraform_json_line() {
        let mut normalizer = RecordNormalizer::new();
        let record = normalizer.normalize(payload(json!({
            "@level": "info",
            "@message": "aws_instance.web: Creating...",
            "@module": "terraform.ui",
            "@timestamp": "2025-09-09T11:05:51.089168+03:00",
        })));

        assert_eq!(record.timestamp, "2025-09-09T11:05:51.089168+03:00");
        assert_eq!(record.level.as_deref(), Some("INFO"));
        assert_eq!(record.message.as_deref(), Some("aws_instance.web: Creating..."));
        assert_eq!(record.resource_id(), Some("aws_instance.web"));
        assert_eq!(record.request_id, None);
        assert!(record.section.is_none());
        assert_eq!(record.source.get("@module"), Some(&json!("terraform.ui")));
    }

    #[test]
    fn test_key_precedence() {
        let mut normalizer = RecordNormalizer::new();
        let record = normalizer.normalize(payload(json!({
            "msg": "second choice",
            "@message": "first choice",
            "level": "debug",
            "@level": "error",
            "time": "2024-01-01T00:00:00Z",
            "@timestamp": "2024-06-01T00:00:00Z",
        })));

        assert_eq!(record.message.as_deref(), Some("first choice"));
        assert_eq!(record.level.as_deref(), Some("ERROR"));
        assert_eq!(record.timestamp, "2024-06-01T00:00:00+00:00");
    }

    #[test]
    fn test_blank_keys_are_skipped() {
        let mut normalizer = RecordNormalizer::new();
        let record = normalizer.normalize(payload(json!({
            "@message": "  ",
            "message": "real message",
            "@timestamp": "",
            "timestamp": "2024-01-15 10:00:00",
        })));

        assert_eq!(record.message.as_deref(), Some("real message"));
        assert_eq!(record.timestamp, "2024-01-15T10:00:00");
    }

    #[test]
    fn test_timestamp_and_level_from_message_text() {
        let mut normalizer = RecordNormalizer::new();
        let record = normalizer.normalize(payload(json!({
            "log": "2024/01/15 10:00:00 [WARN] Provider produced invalid plan"
        })));

        assert_eq!(record.timestamp, "2024-01-15T10:00:00");
        assert_eq!(record.level.as_deref(), Some("WARN"));
        assert_eq!(normalizer.stats().embedded_timestamps, 1);
    }

    #[test]
    fn test_epoch_timestamp() {
        let mut normalizer = RecordNormalizer::new();
        let record = normalizer.normalize(payload(json!({"ts": 1_700_000_000, "msg": "x"})));
        assert_eq!(record.timestamp, "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_message_fallback_first_short_string() {
        let mut normalizer = RecordNormalizer::new();
        let blob = "x".repeat(5000);
        let record = normalizer.normalize(payload(json!({
            "count": 3,
            "blob": blob,
            "note": "short enough",
            "other": "later string",
        })));

        assert_eq!(record.message.as_deref(), Some("short enough"));
    }

    #[test]
    fn test_missing_everything() {
        let mut normalizer = RecordNormalizer::new();
        let record = normalizer.normalize(payload(json!({"n": 1, "nested": {"a": "b"}})));

        assert_eq!(record.timestamp, FAR_FUTURE_TIMESTAMP);
        assert!(record.is_far_future());
        assert_eq!(record.level, None);
        assert_eq!(record.message, None);
        assert_eq!(record.resource, None);
        assert_eq!(normalizer.stats().missing_messages, 1);
        assert_eq!(normalizer.stats().sentinel_timestamps, 1);
    }

    #[test]
    fn test_timestamp_carry_forward_across_records() {
        let mut normalizer = RecordNormalizer::new();
        let first = normalizer.normalize(payload(json!({
            "@timestamp": "2024-01-15T10:00:00Z", "@message": "one"
        })));
        let second = normalizer.normalize(payload(json!({"@message": "two"})));
        let third = normalizer.normalize(payload(json!({
            "@timestamp": "garbled", "@message": "three"
        })));

        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!(third.timestamp, first.timestamp);
        assert_eq!(normalizer.stats().carried_forward_timestamps, 2);
    }

    #[test]
    fn test_fresh_normalizer_does_not_inherit_history() {
        let mut first_run = RecordNormalizer::new();
        first_run.normalize(payload(json!({"@timestamp": "2024-01-15T10:00:00Z"})));

        let mut second_run = RecordNormalizer::new();
        let record = second_run.normalize(payload(json!({"@message": "no time"})));
        assert_eq!(record.timestamp, FAR_FUTURE_TIMESTAMP);
    }

    #[test]
    fn test_unknown_level_passthrough() {
        let mut normalizer = RecordNormalizer::new();
        let record = normalizer.normalize(payload(json!({"@level": "notice", "@message": "m"})));
        assert_eq!(record.level.as_deref(), Some("NOTICE"));
        assert_eq!(normalizer.stats().passthrough_levels, 1);
    }

    #[test]
    fn test_vertex_resource() {
        let mut normalizer = RecordNormalizer::new();
        let record = normalizer.normalize(payload(json!({
            "@message": r#"walk: visiting vertex "aws_vpc.main (expand)""#
        })));
        let resource = record.resource.unwrap();
        assert_eq!(resource.id, "aws_vpc.main");
        assert_eq!(resource.origin, ResourceOrigin::Vertex);
    }

    #[test]
    fn test_custom_keys_from_config() {
        let config = EngineConfig {
            message_keys: vec!["text".to_string()],
            ..EngineConfig::default()
        };
        let mut normalizer = RecordNormalizer::with_config(&config);
        let record = normalizer.normalize(payload(json!({"@message": "ignored", "text": "used"})));
        assert_eq!(record.message.as_deref(), Some("used"));
    }
}
