/// Record normalization module
///
/// Turns one raw JSON payload (one line of a Terraform log) into a
/// [`NormalizedRecord`] with a canonical timestamp, severity, message and
/// inferred resource.
///
/// # Architecture
///
/// - `patterns.rs`: Well-known key tables and text patterns
/// - `timestamp.rs`: Timestamp canonicalization and the carry-forward resolver
/// - `level.rs`: Severity canonicalization
/// - `resource.rs`: Resource / vertex inference from message text
/// - `normalize.rs`: The per-record normalizer tying it all together
/// - `stats.rs`: Per-run counters
///
/// # Guarantees
///
/// Normalization never fails. Every payload yields exactly one record and the
/// record's timestamp is never empty.

pub mod model;
pub mod patterns;
pub mod timestamp;
pub mod level;
pub mod resource;
pub mod normalize;
pub mod stats;

// Re-export commonly used types
pub use model::{NormalizedRecord, RawPayload, ResourceOrigin, ResourceRef};
pub use normalize::RecordNormalizer;
pub use stats::RunStats;
pub use timestamp::TimestampResolver;

// Constants
pub const MAX_FALLBACK_MESSAGE_LEN: usize = 1000;
pub const MAX_LINE_SIZE: usize = 1_048_576; // 1MB
pub const FAR_FUTURE_TIMESTAMP: &str = "8999-12-31T23:59:59.999999";
/// Epoch values above this are treated as milliseconds.
pub const EPOCH_MILLIS_THRESHOLD: i64 = 1_000_000_000_000;
