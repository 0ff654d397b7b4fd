//! The adapter boundary: one work item in, routed transfers out.
//!
//! Item-level problems never escape [`Processor::process`]; they come back
//! as a [`Channel::Failure`](crate::routing::Channel::Failure) transfer. Only
//! a [`ConfigurationError`] stops the caller.

pub mod ocr;
pub mod translate;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::consts::DEFAULT_INVOKE_TIMEOUT_SECS;
use crate::error::ConfigurationError;
use crate::item::WorkItem;
use crate::outcome::Outcome;
use crate::routing::Transfer;

pub use ocr::OcrProcessor;
pub use translate::TranslationProcessor;

#[async_trait]
pub trait Processor: Send + Sync {
    fn name(&self) -> &'static str;
    async fn process(&self, item: WorkItem) -> Result<Vec<Transfer>, ConfigurationError>;
}

pub struct ProcessorConfig {
    /// Upper bound on one engine call, including waiting for a
    /// reconfiguration to finish.
    pub invoke_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            invoke_timeout: Duration::from_secs(DEFAULT_INVOKE_TIMEOUT_SECS),
        }
    }
}

fn log_outcome(processor: &str, item: &WorkItem, outcome: &Outcome) {
    match outcome {
        Outcome::Success { content, .. } => {
            debug!(processor, item = %item.fingerprint(), bytes = content.len(), "item succeeded");
        }
        Outcome::Failure(failure) => {
            warn!(
                processor,
                item = %item.fingerprint(),
                kind = failure.kind(),
                "item failed: {failure}"
            );
        }
    }
}
