use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{Configuration, Engine, EngineDetails, EngineResponse, Payload};
use crate::consts::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_OCR_HOST, DEFAULT_OCR_PORT, DEFAULT_OCR_SCHEME,
    DEFAULT_RESPONSE_CHARSET, OCR_PATH, VERSION_UNKNOWN,
};
use crate::error::EngineError;
use crate::transport::http::HttpTransport;

/// Endpoint settings, read from the engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
    timeout_secs: u64,
    default_charset: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_OCR_SCHEME.to_string(),
            host: DEFAULT_OCR_HOST.to_string(),
            port: DEFAULT_OCR_PORT,
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            default_charset: DEFAULT_RESPONSE_CHARSET.to_string(),
        }
    }
}

/// A remote OpenOCR server reached over HTTP.
#[derive(Debug, Default)]
pub struct OpenOcrEngine {
    transport: Option<HttpTransport>,
}

impl OpenOcrEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Engine for OpenOcrEngine {
    fn describe(&self) -> EngineDetails {
        EngineDetails::new("OpenOCR", VERSION_UNKNOWN)
    }

    async fn configure(&mut self, config: &Configuration) -> Result<()> {
        let endpoint: Endpoint = serde_json::from_value(config.clone().into_value())
            .context("invalid OpenOCR endpoint configuration")?;
        self.transport = Some(HttpTransport::new(
            &endpoint.scheme,
            &endpoint.host,
            endpoint.port,
            OCR_PATH,
            Duration::from_secs(endpoint.timeout_secs),
            endpoint.default_charset,
        )?);
        Ok(())
    }

    async fn invoke(&self, payload: &Payload) -> Result<EngineResponse, EngineError> {
        let Some(transport) = &self.transport else {
            return Err(EngineError::failed("OpenOCR engine is not configured"));
        };
        let Payload::Ocr(req) = payload else {
            return Err(EngineError::failed(format!(
                "OpenOCR can't handle {} requests",
                payload.kind()
            )));
        };
        let body =
            serde_json::to_vec(req).map_err(|e| EngineError::Serialization(e.to_string()))?;
        transport.post_json(body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TranslationRequest;

    #[tokio::test]
    async fn defaults_point_at_local_server() {
        let mut engine = OpenOcrEngine::new();
        engine.configure(&Configuration::default()).await.unwrap();
        let url = engine.transport.as_ref().unwrap().url().to_string();
        assert_eq!(url, "http://localhost:9292/ocr");
    }

    #[tokio::test]
    async fn endpoint_fields_override_defaults() {
        let mut engine = OpenOcrEngine::new();
        let config = Configuration::from_json_str(
            r#"{"scheme":"https","host":"ocr.internal","port":8443}"#,
        )
        .unwrap();
        engine.configure(&config).await.unwrap();
        let url = engine.transport.as_ref().unwrap().url().to_string();
        assert_eq!(url, "https://ocr.internal:8443/ocr");
    }

    #[tokio::test]
    async fn bad_scheme_fails_configure() {
        let mut engine = OpenOcrEngine::new();
        let config = Configuration::from_json_str(r#"{"scheme":"gopher"}"#).unwrap();
        assert!(engine.configure(&config).await.is_err());
    }

    #[tokio::test]
    async fn unknown_field_fails_configure() {
        let mut engine = OpenOcrEngine::new();
        let config = Configuration::from_json_str(r#"{"hots":"typo"}"#).unwrap();
        assert!(engine.configure(&config).await.is_err());
    }

    #[tokio::test]
    async fn unconfigured_engine_refuses() {
        let engine = OpenOcrEngine::new();
        let payload = Payload::Ocr(crate::request::OcrRequest {
            engine: "tesseract".to_string(),
            engine_args: Default::default(),
            preprocessors: vec![],
            img_base64: "AA==".to_string(),
        });
        assert!(matches!(
            engine.invoke(&payload).await,
            Err(EngineError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn translation_payload_rejected() {
        let mut engine = OpenOcrEngine::new();
        engine.configure(&Configuration::default()).await.unwrap();
        let payload = Payload::Translation(TranslationRequest {
            source_language: "fr".to_string(),
            target_language: "en".to_string(),
            content: "x".to_string(),
        });
        let err = engine.invoke(&payload).await.unwrap_err();
        assert!(err.to_string().contains("translation"));
    }
}
