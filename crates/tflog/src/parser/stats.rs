use serde::Serialize;

use super::timestamp::Resolution;

/// Where a record's raw timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    Payload,
    MessageText,
    Missing,
}

/// Counters for one normalization + segmentation run.
///
/// Runs are single-threaded, so these are plain integers rather than the
/// atomics a shared metrics registry would need. Reported at debug level when
/// a run finishes and available to callers via
/// [`Segmentation::stats`](crate::Segmentation).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub records: u64,
    pub payload_timestamps: u64,
    pub embedded_timestamps: u64,
    pub carried_forward_timestamps: u64,
    pub sentinel_timestamps: u64,
    pub passthrough_levels: u64,
    pub missing_messages: u64,
    pub skipped_lines: u64,
    pub sections_opened: u64,
    pub anonymous_sections: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_timestamp(&mut self, source: TimestampSource, resolution: Resolution) {
        match resolution {
            Resolution::Parsed => match source {
                TimestampSource::Payload => self.payload_timestamps += 1,
                TimestampSource::MessageText => self.embedded_timestamps += 1,
                TimestampSource::Missing => {}
            },
            Resolution::CarriedForward => self.carried_forward_timestamps += 1,
            Resolution::Sentinel => self.sentinel_timestamps += 1,
        }
    }

    #[inline]
    pub fn record_section_opened(&mut self, anonymous: bool) {
        self.sections_opened += 1;
        if anonymous {
            self.anonymous_sections += 1;
        }
    }

    /// Fold another run's counters into this one.
    pub fn merge(&mut self, other: &RunStats) {
        self.records += other.records;
        self.payload_timestamps += other.payload_timestamps;
        self.embedded_timestamps += other.embedded_timestamps;
        self.carried_forward_timestamps += other.carried_forward_timestamps;
        self.sentinel_timestamps += other.sentinel_timestamps;
        self.passthrough_levels += other.passthrough_levels;
        self.missing_messages += other.missing_messages;
        self.skipped_lines += other.skipped_lines;
        self.sections_opened += other.sections_opened;
        self.anonymous_sections += other.anonymous_sections;
    }
}
