use std::fmt;

use serde::{Deserialize, Serialize};

/// Operation family of a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    #[default]
    Plan,
    Apply,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Plan => "plan",
            SectionKind::Apply => "apply",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Role of a record within its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionEvent {
    Start,
    Inside,
    End,
}

impl SectionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionEvent::Start => "start",
            SectionEvent::Inside => "inside",
            SectionEvent::End => "end",
        }
    }
}

impl fmt::Display for SectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Section annotation written onto a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionMark {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub event: SectionEvent,
}

/// Identity of an open section.
///
/// Keyed sections are looked up by request id, anonymous ones by their
/// own section id. The two never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionKey {
    Request(String),
    Anonymous(u32),
}

impl SectionKey {
    pub fn is_request(&self) -> bool {
        matches!(self, SectionKey::Request(_))
    }

    pub fn matches_request(&self, request_id: &str) -> bool {
        matches!(self, SectionKey::Request(id) if id == request_id)
    }
}

/// A contiguous run of records forming one plan or apply operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// 1-based, assigned in creation order
    pub id: u32,

    #[serde(rename = "type")]
    pub kind: SectionKind,

    /// `None` for anonymous sections
    pub request_id: Option<String>,

    pub start_index: usize,
    pub end_index: Option<usize>,

    pub start_timestamp: String,
    pub end_timestamp: Option<String>,

    /// Records attached to this section, including the opening one
    pub entry_count: usize,
}

impl Section {
    pub fn is_open(&self) -> bool {
        self.end_index.is_none()
    }

    pub fn is_anonymous(&self) -> bool {
        self.request_id.is_none()
    }

    pub fn key(&self) -> SectionKey {
        match &self.request_id {
            Some(id) => SectionKey::Request(id.clone()),
            None => SectionKey::Anonymous(self.id),
        }
    }

    /// Index range covered by a closed section.
    pub fn span(&self) -> Option<std::ops::RangeInclusive<usize>> {
        self.end_index.map(|end| self.start_index..=end)
    }
}
