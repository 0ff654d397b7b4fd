//! Pluggable engines: the external component that actually translates or
//! extracts text. The adapter only manages which one is active and how it
//! is called.

pub mod echo;
pub mod mock;
pub mod openocr;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::capability::CapabilitySet;
use crate::error::EngineError;
use crate::request::{OcrRequest, TranslationRequest};

/// Stable name of an engine implementation, as registered in the
/// [`EngineRegistry`](crate::registry::EngineRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EngineIdentity(String);

impl EngineIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EngineIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EngineIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EngineIdentity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Opaque engine configuration. Compared structurally to detect drift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Map<String, Value>);

impl Configuration {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parse a JSON object. Anything else is rejected.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(Self(map)),
            other => anyhow::bail!("configuration must be a JSON object, got {other}"),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Configuration {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// What an engine says about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineDetails {
    pub name: String,
    pub version: String,
}

impl EngineDetails {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Engine-specific request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Translation(TranslationRequest),
    Ocr(OcrRequest),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Translation(_) => "translation",
            Payload::Ocr(_) => "ocr",
        }
    }
}

/// What a successful engine call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineResponse {
    pub content: Vec<u8>,
    pub metadata: BTreeMap<String, String>,
}

impl EngineResponse {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The swappable brain. Could be an in-process connector, a remote
/// server, or a test script.
#[async_trait]
pub trait Engine: Send + Sync {
    fn describe(&self) -> EngineDetails;

    /// Apply a configuration. Called once after instantiation and again
    /// whenever the configuration changes.
    async fn configure(&mut self, config: &Configuration) -> Result<()>;

    /// Whether [`supported_operations`](Engine::supported_operations) is
    /// meaningful for this engine.
    fn queries_capabilities(&self) -> bool {
        false
    }

    async fn supported_operations(&self) -> Result<CapabilitySet, EngineError> {
        Ok(CapabilitySet::default())
    }

    async fn invoke(&self, payload: &Payload) -> Result<EngineResponse, EngineError>;
}
