/// Section tracking module
///
/// Groups normalized records into plan/apply operation sections.
///
/// # Architecture
///
/// - `model.rs`: Section, SectionMark and friends
/// - `rules.rs`: Ordered start / end / type classification rules
/// - `tracker.rs`: The single-pass state machine
///
/// Records carrying a request id are grouped by that id: a run of equal ids
/// is one section, and a different (or missing) id closes it. Records
/// without an id fall back to phrase detection and form anonymous sections.

pub mod model;
pub mod rules;
pub mod tracker;

// Re-export commonly used types
pub use model::{Section, SectionEvent, SectionKind, SectionMark};
pub use tracker::SectionTracker;

/// Payload key holding the Terraform request id.
pub const DEFAULT_REQUEST_ID_KEY: &str = "tf_req_id";
