//! Conf module — engine configuration model, loading and errors.

pub mod model;
pub mod load;
pub mod error;

pub use error::ConfigError;
pub use model::EngineConfig;
