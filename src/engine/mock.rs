use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Configuration, Engine, EngineDetails, EngineResponse, Payload};
use crate::capability::{CapabilitySet, LanguagePair};
use crate::consts::{LANGUAGE_AUTO, VERSION_UNKNOWN};
use crate::error::EngineError;

/// Call counters shared between a [`MockConnector`] and the test that
/// built it. Clones observe the same counts.
#[derive(Debug, Clone, Default)]
pub struct MockCounters {
    configure: Arc<AtomicUsize>,
    capabilities: Arc<AtomicUsize>,
    invoke: Arc<AtomicUsize>,
}

impl MockCounters {
    pub fn configure_calls(&self) -> usize {
        self.configure.load(Ordering::SeqCst)
    }

    pub fn capability_calls(&self) -> usize {
        self.capabilities.load(Ordering::SeqCst)
    }

    pub fn invoke_calls(&self) -> usize {
        self.invoke.load(Ordering::SeqCst)
    }
}

/// A scripted translation connector for tests.
///
/// Refuses to work before `configure`, like a real connector would.
/// Configuration `{"fail": true}` makes `configure` fail and
/// `{"fail_capabilities": true}` breaks the capability query.
#[derive(Debug, Clone)]
pub struct MockConnector {
    pairs: Option<Vec<LanguagePair>>,
    translation: String,
    failure: Option<String>,
    delay: Option<Duration>,
    configured: bool,
    capabilities_broken: bool,
    counters: MockCounters,
}

impl MockConnector {
    /// Supports `(fr, en)` and `(de, en)` and translates everything to
    /// "Hello world".
    pub fn new(counters: MockCounters) -> Self {
        Self {
            pairs: Some(vec![
                LanguagePair::new("fr", "en"),
                LanguagePair::new("de", "en"),
            ]),
            translation: "Hello world".to_string(),
            failure: None,
            delay: None,
            configured: false,
            capabilities_broken: false,
            counters,
        }
    }

    pub fn with_pairs(mut self, pairs: Vec<LanguagePair>) -> Self {
        self.pairs = Some(pairs);
        self
    }

    /// Don't answer capability queries at all.
    pub fn without_capabilities(mut self) -> Self {
        self.pairs = None;
        self
    }

    pub fn translating_to(mut self, text: impl Into<String>) -> Self {
        self.translation = text.into();
        self
    }

    /// Every `invoke` fails with this message.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Sleep this long inside `invoke`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Engine for MockConnector {
    fn describe(&self) -> EngineDetails {
        EngineDetails::new("Mock Connector", VERSION_UNKNOWN)
    }

    async fn configure(&mut self, config: &Configuration) -> Result<()> {
        self.counters.configure.fetch_add(1, Ordering::SeqCst);
        if config.get("fail").and_then(|v| v.as_bool()) == Some(true) {
            self.configured = false;
            bail!("mock connector told to fail configuration");
        }
        self.capabilities_broken =
            config.get("fail_capabilities").and_then(|v| v.as_bool()) == Some(true);
        self.configured = true;
        Ok(())
    }

    fn queries_capabilities(&self) -> bool {
        self.pairs.is_some()
    }

    async fn supported_operations(&self) -> Result<CapabilitySet, EngineError> {
        self.counters.capabilities.fetch_add(1, Ordering::SeqCst);
        if !self.configured {
            return Err(EngineError::failed("configure must be called first"));
        }
        if self.capabilities_broken {
            return Err(EngineError::failed("language list unavailable"));
        }
        Ok(self.pairs.iter().flatten().cloned().collect())
    }

    async fn invoke(&self, payload: &Payload) -> Result<EngineResponse, EngineError> {
        self.counters.invoke.fetch_add(1, Ordering::SeqCst);
        if !self.configured {
            return Err(EngineError::failed("configure must be called first"));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(EngineError::failed(message.clone()));
        }

        let Payload::Translation(req) = payload else {
            return Err(EngineError::failed("mock connector only translates"));
        };

        // Pretend to detect French when asked to.
        let detected = if req.source_language == LANGUAGE_AUTO {
            "fr"
        } else {
            req.source_language.as_str()
        };

        Ok(EngineResponse::new(self.translation.as_bytes())
            .with_metadata("source_language", detected))
    }
}
