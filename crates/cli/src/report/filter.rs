use chrono::{DateTime, Utc};
use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use thiserror::Error;

use tflog::parser::timestamp;
use tflog::NormalizedRecord;

use super::ReportOptions;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),

    #[error("Invalid time bound for --{flag}: {value:?}")]
    InvalidTime { flag: &'static str, value: String },
}

/// Case-insensitive regex over a record's message, or over its serialized
/// payload when it has none.
pub struct GrepEngine {
    matcher: RegexMatcher,
}

impl GrepEngine {
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(true)
            .multi_line(false)
            .build(pattern)
            .map_err(|e| FilterError::InvalidRegex(e.to_string()))?;

        Ok(Self { matcher })
    }

    #[inline]
    pub fn is_match(&self, record: &NormalizedRecord) -> bool {
        match record.message.as_deref() {
            Some(message) => self.matcher.is_match(message.as_bytes()).unwrap_or(false),
            None => serde_json::to_vec(&record.source)
                .map(|bytes| self.matcher.is_match(&bytes).unwrap_or(false))
                .unwrap_or(false),
        }
    }
}

/// Inclusive window over parsed record timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn parse(since: Option<&str>, until: Option<&str>) -> Result<Self, FilterError> {
        Ok(Self {
            since: since.map(|v| parse_bound("since", v)).transpose()?,
            until: until.map(|v| parse_bound("until", v)).transpose()?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    /// Records whose timestamp does not parse are outside any bounded window.
    pub fn contains(&self, record: &NormalizedRecord) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(instant) = timestamp::parse_instant(&record.timestamp) else {
            return false;
        };
        self.since.map_or(true, |since| instant >= since)
            && self.until.map_or(true, |until| instant <= until)
    }
}

fn parse_bound(flag: &'static str, value: &str) -> Result<DateTime<Utc>, FilterError> {
    timestamp::canonicalize(value)
        .as_deref()
        .and_then(timestamp::parse_instant)
        .ok_or_else(|| FilterError::InvalidTime {
            flag,
            value: value.to_string(),
        })
}

pub struct RecordFilter {
    level: Option<String>,
    grep: Option<GrepEngine>,
    window: TimeWindow,
}

impl RecordFilter {
    pub fn from_options(options: &ReportOptions) -> Result<Self, FilterError> {
        Ok(Self {
            level: options
                .filter_level
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_ascii_uppercase),
            grep: options.grep.as_deref().map(GrepEngine::new).transpose()?,
            window: TimeWindow::parse(options.since.as_deref(), options.until.as_deref())?,
        })
    }

    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        if let Some(level) = &self.level {
            if !record
                .level
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case(level))
            {
                return false;
            }
        }
        if let Some(grep) = &self.grep {
            if !grep.is_match(record) {
                return false;
            }
        }
        self.window.contains(record)
    }

    /// Indices of the matching records, in input order.
    pub fn apply(&self, records: &[NormalizedRecord]) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record))
            .map(|(i, _)| i)
            .collect()
    }
}
