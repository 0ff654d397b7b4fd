use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Processor, ProcessorConfig, log_outcome};
use crate::capability::LanguagePair;
use crate::config::TranslationSettings;
use crate::engine::Payload;
use crate::error::ConfigurationError;
use crate::expression::evaluate;
use crate::item::WorkItem;
use crate::manager::{EngineHandle, EngineManager};
use crate::outcome::{Failure, Outcome};
use crate::request::build_translation;
use crate::routing::{RoutingMode, Transfer, transfers};
use crate::transport;

/// Translates each item's text with the configured connector. On success
/// the translation replaces the content.
pub struct TranslationProcessor {
    manager: Arc<EngineManager>,
    settings: RwLock<TranslationSettings>,
    config: ProcessorConfig,
}

impl TranslationProcessor {
    pub fn new(
        manager: Arc<EngineManager>,
        settings: TranslationSettings,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            manager,
            settings: RwLock::new(settings),
            config,
        }
    }

    /// Swap settings at runtime. The next item picks them up; a changed
    /// connector or connector config reconfigures the engine then.
    pub async fn set_settings(&self, settings: TranslationSettings) {
        *self.settings.write().await = settings;
    }

    async fn attempt(
        &self,
        handle: &EngineHandle,
        item: &WorkItem,
        source: &str,
        target: &str,
    ) -> Outcome {
        if item.is_empty() {
            return Failure::EmptyInput.into();
        }

        let pair = LanguagePair::new(
            evaluate(source, item.attributes()),
            evaluate(target, item.attributes()),
        );
        if !handle.admit(&pair).is_admitted() {
            return Failure::CapabilityMismatch {
                requested: pair.to_string(),
            }
            .into();
        }

        let request = match build_translation(item, &pair) {
            Ok(request) => request,
            Err(e) => return Failure::from(e).into(),
        };
        debug!(
            engine = %handle.identity(),
            connector = %handle.details().name,
            %pair,
            "translating"
        );
        transport::invoke(
            handle,
            &Payload::Translation(request),
            self.config.invoke_timeout,
        )
        .await
    }
}

#[async_trait]
impl Processor for TranslationProcessor {
    fn name(&self) -> &'static str {
        "translate"
    }

    async fn process(&self, item: WorkItem) -> Result<Vec<Transfer>, ConfigurationError> {
        let (identity, configuration, source, target) = {
            let s = self.settings.read().await;
            (
                s.identity(),
                s.configuration(),
                s.source_language.clone(),
                s.target_language.clone(),
            )
        };

        let handle = self.manager.ensure_ready(&identity, &configuration).await?;
        let outcome = self.attempt(&handle, &item, &source, &target).await;
        log_outcome(self.name(), &item, &outcome);
        Ok(transfers(item, outcome, RoutingMode::Replace))
    }
}
