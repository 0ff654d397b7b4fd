use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::EngineError;

/// Result of attempting one work item. Failures are information, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        content: Vec<u8>,
        metadata: BTreeMap<String, String>,
    },
    Failure(Failure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failure(f) => Some(f),
            Outcome::Success { .. } => None,
        }
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Outcome::Failure(failure)
    }
}

/// Item-level failure kinds. None of these stop the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// Zero-length content; nothing was sent anywhere.
    EmptyInput,
    /// The active engine doesn't support the requested operation.
    CapabilityMismatch { requested: String },
    /// Request could not be encoded, or response could not be decoded.
    Serialization { detail: String },
    /// Remote answered with a non-200 status.
    RemoteStatus { code: u16, reason: String },
    /// Connectivity, timeout or malformed response.
    Transport { detail: String },
    /// Raised by an in-process engine.
    Engine { message: String },
    /// The input itself could not be read, so there is no content to route.
    Unreadable { detail: String },
}

impl Failure {
    /// Stable short name, used in logs and failure sidecars.
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::EmptyInput => "empty_input",
            Failure::CapabilityMismatch { .. } => "capability_mismatch",
            Failure::Serialization { .. } => "serialization",
            Failure::RemoteStatus { .. } => "remote_status",
            Failure::Transport { .. } => "transport",
            Failure::Engine { .. } => "engine",
            Failure::Unreadable { .. } => "unreadable",
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Failure::Transport {
            detail: detail.into(),
        }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Failure::Engine {
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::EmptyInput => write!(f, "can't process empty content"),
            Failure::CapabilityMismatch { requested } => {
                write!(f, "requested operation {requested} isn't supported")
            }
            Failure::Serialization { detail } => write!(f, "serialization failed: {detail}"),
            Failure::RemoteStatus { code, reason } => {
                write!(f, "server responded with status code {code} ({reason})")
            }
            Failure::Transport { detail } => write!(f, "transport failed: {detail}"),
            Failure::Engine { message } => write!(f, "engine failed: {message}"),
            Failure::Unreadable { detail } => write!(f, "can't read input: {detail}"),
        }
    }
}

impl From<EngineError> for Failure {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Failed(message) => Failure::Engine { message },
            EngineError::RemoteStatus { code, reason } => Failure::RemoteStatus { code, reason },
            EngineError::Transport(detail) => Failure::Transport { detail },
            EngineError::Serialization(detail) => Failure::Serialization { detail },
        }
    }
}
