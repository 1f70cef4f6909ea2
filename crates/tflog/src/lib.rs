// Terraform log normalization and operation-section detection.

// Core engine
pub mod parser;
pub mod section;

// Supporting modules
pub mod conf;
pub mod source;
pub mod pipeline;

pub use conf::{ConfigError, EngineConfig};
pub use parser::{NormalizedRecord, RawPayload, RecordNormalizer, RunStats};
pub use pipeline::{segment, segment_reader, Segmentation};
pub use section::{Section, SectionEvent, SectionKind, SectionMark, SectionTracker};
pub use source::{JsonlSource, SourceError};
