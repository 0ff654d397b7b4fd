//! Request builders: turn a work item plus options into an engine payload.

pub mod ocr;
pub mod translation;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Map, Value};

use crate::consts::DEFAULT_OCR_ENGINE;
use crate::outcome::Failure;

pub use ocr::{OcrRequest, build_ocr};
pub use translation::{TranslationRequest, build_translation};

/// Per-item overrides layered over [`RequestDefaults`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Replaces the default list entirely when set.
    pub preprocessors: Option<Vec<String>>,
    /// Merged over the default arguments; these keys win.
    pub engine_args: Map<String, Value>,
}

/// Configuration-level defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub engine: String,
    pub preprocessors: Vec<String>,
    pub engine_args: Map<String, Value>,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            engine: DEFAULT_OCR_ENGINE.to_string(),
            preprocessors: Vec::new(),
            engine_args: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    EmptyInput,
    Serialization(String),
}

impl From<BuildError> for Failure {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::EmptyInput => Failure::EmptyInput,
            BuildError::Serialization(detail) => Failure::Serialization { detail },
        }
    }
}

/// Standard (padded) base64, as carried in JSON envelopes.
pub fn encode_content(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_content(encoded: &str) -> Result<Vec<u8>, BuildError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| BuildError::Serialization(format!("invalid base64: {e}")))
}

/// Split a comma-separated preprocessor list, trimming whitespace and
/// dropping empty entries. Order is preserved.
pub fn parse_preprocessors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse engine arguments, which must be a JSON object.
pub fn parse_engine_args(raw: &str) -> Result<Map<String, Value>, BuildError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(BuildError::Serialization(format!(
            "engine arguments must be a JSON object, got {other}"
        ))),
        Err(e) => Err(BuildError::Serialization(format!(
            "can't parse engine arguments: {e}"
        ))),
    }
}

/// Defaults first, then overrides key by key.
pub(crate) fn merge_args(
    defaults: &Map<String, Value>,
    overrides: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (k, v) in overrides {
        merged.insert(k.clone(), v.clone());
    }
    merged
}
