use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use tflog::parser::timestamp;
use tflog::NormalizedRecord;

/// Time span covered by one request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub request_id: String,
    /// Earliest canonical timestamp; `None` if no record had a usable one
    pub start: Option<String>,
    pub end: Option<String>,
    pub count: usize,
    pub has_errors: bool,
    #[serde(skip)]
    bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl Interval {
    fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            start: None,
            end: None,
            count: 0,
            has_errors: false,
            bounds: None,
        }
    }

    fn add(&mut self, record: &NormalizedRecord) {
        self.count += 1;
        if matches!(record.level.as_deref(), Some("ERROR") | Some("CRITICAL")) {
            self.has_errors = true;
        }

        if record.is_far_future() {
            return;
        }
        let Some(instant) = timestamp::parse_instant(&record.timestamp) else {
            return;
        };
        let (lo, hi) = self.bounds.get_or_insert((instant, instant));
        if self.start.is_none() || instant < *lo {
            *lo = instant;
            self.start = Some(record.timestamp.clone());
        }
        if self.end.is_none() || instant > *hi {
            *hi = instant;
            self.end = Some(record.timestamp.clone());
        }
    }

    /// Duration in milliseconds between start and end.
    pub fn duration_ms(&self) -> Option<i64> {
        self.bounds.map(|(lo, hi)| (hi - lo).num_milliseconds())
    }
}

/// Group records by request id, ordered by interval start. Records without
/// an id are ignored.
pub fn build<'a, I>(records: I) -> Vec<Interval>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut intervals: Vec<Interval> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(request_id) = record.request_id.as_deref() else {
            continue;
        };
        let pos = match positions.get(request_id) {
            Some(&pos) => pos,
            None => {
                positions.insert(request_id.to_string(), intervals.len());
                intervals.push(Interval::new(request_id));
                intervals.len() - 1
            }
        };
        intervals[pos].add(record);
    }

    // stable: ties and undated intervals keep first-seen order
    intervals.sort_by_key(|interval| match interval.bounds {
        Some((lo, _)) => (0, Some(lo)),
        None => (1, None),
    });
    intervals
}
