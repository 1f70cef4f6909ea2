use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::section::SectionMark;

/// One decoded input line: the top-level JSON object, keys in file order.
pub type RawPayload = Map<String, Value>;

/// Which rule produced a resource identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceOrigin {
    /// Quoted identifier after a `vertex` marker (Terraform graph walk lines)
    Vertex,
    /// Loose `word.word` token; low confidence
    DottedToken,
}

impl ResourceOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceOrigin::Vertex => "vertex",
            ResourceOrigin::DottedToken => "dotted_token",
        }
    }

    pub fn is_low_confidence(&self) -> bool {
        matches!(self, ResourceOrigin::DottedToken)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRef {
    pub id: String,
    pub origin: ResourceOrigin,
}

impl ResourceRef {
    pub fn new(id: impl Into<String>, origin: ResourceOrigin) -> Self {
        Self {
            id: id.into(),
            origin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizedRecord {
    /// Canonical ISO-8601 timestamp; carried forward from earlier records or
    /// the far-future sentinel when nothing could be parsed
    pub timestamp: String,

    /// Uppercased severity (TRACE..CRITICAL, or an unrecognized token as-is)
    pub level: Option<String>,

    /// Best-effort human-readable message
    pub message: Option<String>,

    pub resource: Option<ResourceRef>,

    /// Correlation id, written by the section tracker
    pub request_id: Option<String>,

    /// Section membership, written by the section tracker
    pub section: Option<SectionMark>,

    /// Original payload, for display only
    pub source: RawPayload,
}

impl NormalizedRecord {
    /// Create a record with only the mandatory timestamp set
    pub fn bare(timestamp: impl Into<String>, source: RawPayload) -> Self {
        Self {
            timestamp: timestamp.into(),
            level: None,
            message: None,
            resource: None,
            request_id: None,
            section: None,
            source,
        }
    }

    pub fn is_far_future(&self) -> bool {
        self.timestamp == super::FAR_FUTURE_TIMESTAMP
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource.as_ref().map(|r| r.id.as_str())
    }
}
