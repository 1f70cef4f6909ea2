//! Pipeline — normalize and segment a whole stream in one pass.

use std::io::BufRead;

use serde::Serialize;

use crate::conf::EngineConfig;
use crate::parser::{NormalizedRecord, RawPayload, RecordNormalizer, RunStats};
use crate::section::{Section, SectionTracker};
use crate::source::{JsonlSource, SourceError};

/// Result of one run: every record in input order, the closed sections in
/// creation order, and the run counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Segmentation {
    pub records: Vec<NormalizedRecord>,
    pub sections: Vec<Section>,
    pub stats: RunStats,
}

impl Segmentation {
    pub fn section(&self, id: u32) -> Option<&Section> {
        id.checked_sub(1)
            .and_then(|i| self.sections.get(i as usize))
            .filter(|s| s.id == id)
    }

    /// Records covered by a closed section.
    pub fn records_in(&self, section: &Section) -> &[NormalizedRecord] {
        match section.span() {
            Some(span) => self.records.get(span).unwrap_or(&[]),
            None => &[],
        }
    }
}

/// Normalize and segment an ordered stream of payloads.
pub fn segment<I>(payloads: I, config: &EngineConfig) -> Segmentation
where
    I: IntoIterator<Item = RawPayload>,
{
    let mut normalizer = RecordNormalizer::with_config(config);
    let mut tracker = SectionTracker::with_request_id_key(config.request_id_key.clone());

    for payload in payloads {
        tracker.push(normalizer.normalize(payload));
    }

    let mut segmentation = tracker.finish();
    let section_stats = std::mem::take(&mut segmentation.stats);
    segmentation.stats = normalizer.into_stats();
    segmentation.stats.merge(&section_stats);
    segmentation
}

/// Read a JSON-lines stream and segment it.
///
/// Malformed lines are skipped and counted; an I/O failure aborts the run.
pub fn segment_reader<R: BufRead>(reader: R, config: &EngineConfig) -> Result<Segmentation, SourceError> {
    let mut source = JsonlSource::new(reader);
    let payloads = source.by_ref().collect::<Result<Vec<_>, _>>()?;

    let mut segmentation = segment(payloads, config);
    segmentation.stats.skipped_lines = source.skipped();

    let stats = &segmentation.stats;
    tracing::debug!(
        lines = source.lines_read(),
        records = stats.records,
        skipped = stats.skipped_lines,
        sections = stats.sections_opened,
        anonymous_sections = stats.anonymous_sections,
        carried_forward = stats.carried_forward_timestamps,
        sentinel = stats.sentinel_timestamps,
        "run finished"
    );

    Ok(segmentation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{SectionEvent, SectionKind};
    use std::io::Cursor;

    const APPLY_LOG: &str = r#"{"@level":"info","@message":"Terraform version: 1.9.0","@timestamp":"2025-01-01T10:00:00Z"}
{"@level":"info","@message":"CLI args: []string{\"terraform\", \"apply\"}","@timestamp":"2025-01-01T10:00:01Z"}
{"@level":"debug","@message":"provider started","@timestamp":"2025-01-01T10:00:02Z","tf_req_id":"r1"}
{"@level":"debug","@message":"vertex \"aws_instance.web (expand)\" walking","tf_req_id":"r1"}
{"@level":"info","@message":"Apply complete! Resources: 1 added, 0 changed, 0 destroyed.","@timestamp":"2025-01-01T10:00:09Z"}
not json at all
"#;

    #[test]
    fn test_segment_reader_end_to_end() {
        let seg = segment_reader(Cursor::new(APPLY_LOG), &EngineConfig::default()).unwrap();

        assert_eq!(seg.records.len(), 5);
        assert_eq!(seg.stats.records, 5);
        assert_eq!(seg.stats.skipped_lines, 1);
        assert_eq!(seg.stats.carried_forward_timestamps, 1);

        // record 3 has no timestamp and inherits record 2's
        assert_eq!(seg.records[3].timestamp, seg.records[2].timestamp);
        assert_eq!(seg.records[3].resource_id(), Some("aws_instance.web"));

        assert_eq!(seg.sections.len(), 2);
        let anonymous = &seg.sections[0];
        assert_eq!(anonymous.kind, SectionKind::Apply);
        assert_eq!(anonymous.span(), Some(1..=1));

        let keyed = &seg.sections[1];
        assert_eq!(keyed.request_id.as_deref(), Some("r1"));
        assert_eq!(keyed.span(), Some(2..=3));
        assert_eq!(keyed.entry_count, 2);
        assert_eq!(seg.records_in(keyed).len(), 2);

        // the keyed section closed when the id disappeared; no anonymous
        // section is open to receive the completion line
        assert!(seg.records[0].section.is_none());
        assert!(seg.records[4].section.is_none());
        assert_eq!(seg.stats.sections_opened, 2);
        assert_eq!(seg.stats.anonymous_sections, 1);
    }

    #[test]
    fn test_segment_preserves_length_and_order() {
        let payloads: Vec<RawPayload> = (0..20)
            .map(|i| {
                let mut map = RawPayload::new();
                map.insert("@message".to_string(), format!("line {}", i).into());
                if i % 3 == 0 {
                    map.insert("tf_req_id".to_string(), format!("r{}", i / 6).into());
                }
                map
            })
            .collect();

        let seg = segment(payloads, &EngineConfig::default());
        assert_eq!(seg.records.len(), 20);
        for (i, record) in seg.records.iter().enumerate() {
            assert_eq!(record.message.as_deref(), Some(format!("line {}", i).as_str()));
        }
    }

    #[test]
    fn test_segment_uses_configured_request_key() {
        let config = EngineConfig {
            request_id_key: "trace".to_string(),
            ..Default::default()
        };
        let mut payload = RawPayload::new();
        payload.insert("@message".to_string(), "terraform plan".into());
        payload.insert("trace".to_string(), "t-9".into());

        let seg = segment(vec![payload], &config);
        assert_eq!(seg.sections.len(), 1);
        assert_eq!(seg.sections[0].request_id.as_deref(), Some("t-9"));
        assert_eq!(seg.records[0].section.map(|m| m.event), Some(SectionEvent::Start));
        assert_eq!(seg.section(1).map(|s| s.id), Some(1));
        assert!(seg.section(0).is_none());
        assert!(seg.section(2).is_none());
    }

    #[test]
    fn test_fresh_resolver_per_run() {
        let first = segment_reader(Cursor::new(APPLY_LOG), &EngineConfig::default()).unwrap();
        let second = segment_reader(
            Cursor::new("{\"@message\":\"no time here\"}\n"),
            &EngineConfig::default(),
        )
        .unwrap();

        assert!(!first.records[0].is_far_future());
        assert!(second.records[0].is_far_future());
    }
}
