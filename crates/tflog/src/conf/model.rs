//! Model — EngineConfig.

use serde::{Deserialize, Serialize};

use crate::parser::patterns::{LEVEL_KEYS, MESSAGE_KEYS, TIMESTAMP_KEYS};
use crate::parser::MAX_FALLBACK_MESSAGE_LEN;
use crate::section::DEFAULT_REQUEST_ID_KEY;

/// Tunables for normalization and section tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Payload key holding the request id
    pub request_id_key: String,
    /// Upper bound (exclusive, in characters) for the message fallback
    pub max_fallback_message_len: usize,
    pub timestamp_keys: Vec<String>,
    pub level_keys: Vec<String>,
    pub message_keys: Vec<String>,
}

fn owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_id_key: DEFAULT_REQUEST_ID_KEY.to_string(),
            max_fallback_message_len: MAX_FALLBACK_MESSAGE_LEN,
            timestamp_keys: owned(TIMESTAMP_KEYS),
            level_keys: owned(LEVEL_KEYS),
            message_keys: owned(MESSAGE_KEYS),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.request_id_key.trim().is_empty() {
            return Err("request_id_key must not be empty".to_string());
        }
        if self.max_fallback_message_len == 0 {
            return Err("max_fallback_message_len must be > 0".to_string());
        }
        for (name, keys) in [
            ("timestamp_keys", &self.timestamp_keys),
            ("level_keys", &self.level_keys),
            ("message_keys", &self.message_keys),
        ] {
            if keys.is_empty() {
                return Err(format!("{} must list at least one key", name));
            }
            if keys.iter().any(|k| k.is_empty()) {
                return Err(format!("{} must not contain empty keys", name));
            }
        }
        Ok(())
    }
}
