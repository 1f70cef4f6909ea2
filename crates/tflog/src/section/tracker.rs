//! Tracker — single-pass state machine assigning records to sections.

use serde_json::Value;

use super::model::{Section, SectionEvent, SectionKey, SectionKind, SectionMark};
use super::rules;
use super::DEFAULT_REQUEST_ID_KEY;
use crate::parser::{NormalizedRecord, RawPayload, RunStats};
use crate::pipeline::Segmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    EndPhrase,
    RequestChanged,
    RequestMissing,
    EndOfStream,
}

/// One open section, in opening order.
#[derive(Debug)]
struct OpenSection {
    key: SectionKey,
    /// Position in `SectionTracker::sections`
    slot: usize,
    /// Last record index attached to the section
    last_index: usize,
}

/// Assigns records to plan/apply sections as they stream past.
///
/// The tracker owns the records it has seen so that closing a section can
/// look back at the previous record's timestamp. Feed records in stream
/// order with [`push`](Self::push) and collect everything with
/// [`finish`](Self::finish).
#[derive(Debug)]
pub struct SectionTracker {
    request_id_key: String,
    records: Vec<NormalizedRecord>,
    sections: Vec<Section>,
    /// Open sections ordered by opening; at most one per request id
    open: Vec<OpenSection>,
    stats: RunStats,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::with_request_id_key(DEFAULT_REQUEST_ID_KEY)
    }

    pub fn with_request_id_key(key: impl Into<String>) -> Self {
        Self {
            request_id_key: key.into(),
            records: Vec::new(),
            sections: Vec::new(),
            open: Vec::new(),
            stats: RunStats::new(),
        }
    }

    /// Attach one record and return its index in the stream.
    pub fn push(&mut self, mut record: NormalizedRecord) -> usize {
        let index = self.records.len();
        record.request_id = request_id_of(&record.source, &self.request_id_key);

        let mark = match record.request_id.clone() {
            Some(request_id) => self.attach_keyed(index, &record, request_id),
            None => self.attach_anonymous(index, &record),
        };
        // Marks are written once, here; closing a section never rewrites a
        // mark already on an earlier record.
        record.section = mark;

        self.records.push(record);
        index
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Close everything still open and hand back records, sections and
    /// counters.
    pub fn finish(mut self) -> Segmentation {
        let Some(final_index) = self.records.len().checked_sub(1) else {
            return self.into_segmentation();
        };

        for open in std::mem::take(&mut self.open) {
            let end_index = if open.key.is_request() {
                open.last_index
            } else {
                final_index
            };
            let kind = self.sections[open.slot].kind;
            let id = self.sections[open.slot].id;
            self.close(open.slot, end_index, CloseReason::EndOfStream);

            let record = &mut self.records[end_index];
            if record.section.is_none() {
                record.section = Some(SectionMark {
                    id,
                    kind,
                    event: SectionEvent::End,
                });
            }
        }

        tracing::debug!(
            records = self.records.len(),
            sections = self.sections.len(),
            anonymous = self.stats.anonymous_sections,
            "section tracking finished"
        );

        self.into_segmentation()
    }

    fn into_segmentation(self) -> Segmentation {
        Segmentation {
            records: self.records,
            sections: self.sections,
            stats: self.stats,
        }
    }

    fn attach_keyed(
        &mut self,
        index: usize,
        record: &NormalizedRecord,
        request_id: String,
    ) -> Option<SectionMark> {
        self.close_where(index, CloseReason::RequestChanged, |key| {
            !key.matches_request(&request_id)
        });

        let message = record.message.as_deref().unwrap_or("");
        let (slot, event) = match self.find_open(|key| key.matches_request(&request_id)) {
            Some(pos) => {
                let open = &mut self.open[pos];
                open.last_index = index;
                let slot = open.slot;
                self.sections[slot].entry_count += 1;
                (slot, SectionEvent::Inside)
            }
            None => {
                let kind = rules::classify(message).unwrap_or_default();
                let slot = self.open_section(kind, Some(request_id), index, &record.timestamp);
                (slot, SectionEvent::Start)
            }
        };

        let kind = self.sections[slot].kind;
        let event = if rules::is_end_for(message, kind) {
            self.close_at(slot, index, &record.timestamp, CloseReason::EndPhrase);
            SectionEvent::End
        } else {
            event
        };

        Some(self.mark(slot, event))
    }

    fn attach_anonymous(&mut self, index: usize, record: &NormalizedRecord) -> Option<SectionMark> {
        self.close_where(index, CloseReason::RequestMissing, SectionKey::is_request);

        let message = record.message.as_deref().unwrap_or("");

        if let Some(kind) = rules::start_kind(message) {
            let slot = self.open_section(kind, None, index, &record.timestamp);
            if rules::is_end_for(message, kind) {
                self.close_at(slot, index, &record.timestamp, CloseReason::EndPhrase);
                return Some(self.mark(slot, SectionEvent::End));
            }
            return Some(self.mark(slot, SectionEvent::Start));
        }

        // Keyed sections were all closed above, so only anonymous ones remain.
        if let Some(kind) = rules::end_kind(message) {
            if let Some(pos) = self.find_open_of_kind(kind) {
                let slot = self.open[pos].slot;
                self.sections[slot].entry_count += 1;
                self.close_at(slot, index, &record.timestamp, CloseReason::EndPhrase);
                return Some(self.mark(slot, SectionEvent::End));
            }
        }

        let pos = self.find_open(|key| !key.is_request())?;
        let open = &mut self.open[pos];
        open.last_index = index;
        let slot = open.slot;
        self.sections[slot].entry_count += 1;
        Some(self.mark(slot, SectionEvent::Inside))
    }

    fn open_section(
        &mut self,
        kind: SectionKind,
        request_id: Option<String>,
        index: usize,
        timestamp: &str,
    ) -> usize {
        let id = self.sections.len() as u32 + 1;
        let slot = self.sections.len();
        self.stats.record_section_opened(request_id.is_none());

        tracing::debug!(
            section_id = id,
            kind = %kind,
            request_id = request_id.as_deref().unwrap_or("-"),
            start_index = index,
            "section opened"
        );

        let section = Section {
            id,
            kind,
            request_id,
            start_index: index,
            end_index: None,
            start_timestamp: timestamp.to_string(),
            end_timestamp: None,
            entry_count: 1,
        };
        self.open.push(OpenSection {
            key: section.key(),
            slot,
            last_index: index,
        });
        self.sections.push(section);
        slot
    }

    /// Close every open section whose key matches `predicate` at the
    /// record before `index`.
    fn close_where<F>(&mut self, index: usize, reason: CloseReason, predicate: F)
    where
        F: Fn(&SectionKey) -> bool,
    {
        let Some(end_index) = index.checked_sub(1) else {
            return;
        };
        let (closing, keep): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.open).into_iter().partition(|open| predicate(&open.key));
        self.open = keep;
        for open in closing {
            self.close(open.slot, end_index, reason);
        }
    }

    /// Close the section at `slot` on the record being attached.
    fn close_at(&mut self, slot: usize, index: usize, timestamp: &str, reason: CloseReason) {
        self.open.retain(|open| open.slot != slot);
        self.finalize(slot, index, timestamp.to_string(), reason);
    }

    /// Close the section at `slot` on an already stored record.
    fn close(&mut self, slot: usize, end_index: usize, reason: CloseReason) {
        let timestamp = match self.records.get(end_index) {
            Some(record) => record.timestamp.clone(),
            None => self.sections[slot].start_timestamp.clone(),
        };
        self.finalize(slot, end_index, timestamp, reason);
    }

    fn finalize(&mut self, slot: usize, end_index: usize, timestamp: String, reason: CloseReason) {
        let section = &mut self.sections[slot];
        debug_assert!(section.is_open(), "section {} closed twice", section.id);
        debug_assert!(end_index >= section.start_index);

        section.end_index = Some(end_index);
        section.end_timestamp = Some(timestamp);

        tracing::debug!(
            section_id = section.id,
            kind = %section.kind,
            start_index = section.start_index,
            end_index,
            entries = section.entry_count,
            ?reason,
            "section closed"
        );
    }

    fn find_open<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&SectionKey) -> bool,
    {
        self.open.iter().rposition(|open| predicate(&open.key))
    }

    fn find_open_of_kind(&self, kind: SectionKind) -> Option<usize> {
        self.open
            .iter()
            .rposition(|open| self.sections[open.slot].kind == kind)
    }

    fn mark(&self, slot: usize, event: SectionEvent) -> SectionMark {
        let section = &self.sections[slot];
        SectionMark {
            id: section.id,
            kind: section.kind,
            event,
        }
    }
}

impl Default for SectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Request id of a payload: the exact key first, then any key equal to it
/// ignoring ASCII case. Blank strings, nulls and non-scalar values are
/// treated as absent.
pub fn request_id_of(payload: &RawPayload, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(scalar_id)
        .or_else(|| {
            payload
                .iter()
                .filter(|(name, _)| name.eq_ignore_ascii_case(key))
                .find_map(|(_, value)| scalar_id(value))
        })
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
