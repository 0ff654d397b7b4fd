//! Error types shared across the adapter.
//!
//! [`ConfigurationError`] is fatal: it means the pipeline itself cannot
//! proceed and is surfaced to the operator. [`EngineError`] is what an
//! engine reports for a single call; it is always turned into an item-level
//! [`Failure`](crate::outcome::Failure).

use thiserror::Error;

/// The pipeline is misconfigured. Never downgraded to a per-item failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The identity is not registered.
    #[error("unable to instantiate engine '{identity}': {reason}")]
    InstantiationFailed { identity: String, reason: String },

    /// The engine rejected its configuration.
    #[error("unable to configure engine '{identity}': {reason}")]
    ConfigureFailed { identity: String, reason: String },

    /// The engine claims to report its capabilities but could not.
    #[error("unable to retrieve supported operations from '{identity}': {reason}")]
    CapabilityQueryFailed { identity: String, reason: String },
}

/// An engine call went wrong.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine itself failed (connector error, unsupported payload, ...).
    #[error("{0}")]
    Failed(String),

    /// A remote engine answered with something other than 200.
    #[error("remote responded with status code {code} ({reason})")]
    RemoteStatus { code: u16, reason: String },

    /// Connection failure, timeout or unreadable response.
    #[error("{0}")]
    Transport(String),

    /// The request could not be encoded or the response decoded.
    #[error("{0}")]
    Serialization(String),
}

impl EngineError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
