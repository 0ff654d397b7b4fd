use async_trait::async_trait;
use serde_json::Map;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Processor, ProcessorConfig, log_outcome};
use crate::config::OcrSettings;
use crate::engine::Payload;
use crate::error::ConfigurationError;
use crate::expression::evaluate;
use crate::item::WorkItem;
use crate::manager::{EngineHandle, EngineManager};
use crate::outcome::{Failure, Outcome};
use crate::request::{
    BuildError, RequestOptions, build_ocr, parse_engine_args, parse_preprocessors,
};
use crate::routing::{RoutingMode, Transfer, transfers};
use crate::transport;

/// Extracts text from images through the `openocr` engine. The original
/// item always goes to `success` or `failure` unchanged; extracted text
/// goes to `extracted`.
pub struct OcrProcessor {
    manager: Arc<EngineManager>,
    settings: RwLock<OcrSettings>,
    config: ProcessorConfig,
}

impl OcrProcessor {
    pub fn new(manager: Arc<EngineManager>, settings: OcrSettings, config: ProcessorConfig) -> Self {
        Self {
            manager,
            settings: RwLock::new(settings),
            config,
        }
    }

    pub async fn set_settings(&self, settings: OcrSettings) {
        *self.settings.write().await = settings;
    }

    async fn attempt(&self, handle: &EngineHandle, item: &WorkItem, settings: &OcrSettings) -> Outcome {
        if item.is_empty() {
            return Failure::EmptyInput.into();
        }

        let request = resolve_options(settings, item.attributes())
            .and_then(|options| build_ocr(item, &options, &settings.request_defaults()));
        let request = match request {
            Ok(request) => request,
            Err(e) => return Failure::from(e).into(),
        };
        debug!(
            engine = %handle.identity(),
            preprocessors = ?request.preprocessors,
            "extracting text"
        );
        transport::invoke(handle, &Payload::Ocr(request), self.config.invoke_timeout).await
    }
}

/// Evaluate the per-item expressions. A blank engine-args expression means
/// no overrides.
fn resolve_options(
    settings: &OcrSettings,
    attributes: &BTreeMap<String, String>,
) -> Result<RequestOptions, BuildError> {
    let preprocessors = settings
        .preprocessors
        .as_deref()
        .map(|expr| parse_preprocessors(&evaluate(expr, attributes)));

    let engine_args = match settings.engine_args.as_deref() {
        Some(expr) => {
            let raw = evaluate(expr, attributes);
            if raw.trim().is_empty() {
                Map::new()
            } else {
                parse_engine_args(&raw)?
            }
        }
        None => Map::new(),
    };

    Ok(RequestOptions {
        preprocessors,
        engine_args,
    })
}

#[async_trait]
impl Processor for OcrProcessor {
    fn name(&self) -> &'static str {
        "ocr"
    }

    async fn process(&self, item: WorkItem) -> Result<Vec<Transfer>, ConfigurationError> {
        let settings = self.settings.read().await.clone();
        let handle = self
            .manager
            .ensure_ready(&settings.identity(), &settings.engine_configuration())
            .await?;
        let outcome = self.attempt(&handle, &item, &settings).await;
        log_outcome(self.name(), &item, &outcome);
        Ok(transfers(item, outcome, RoutingMode::PreserveOriginal))
    }
}
