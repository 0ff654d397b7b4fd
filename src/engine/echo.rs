use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{Configuration, Engine, EngineDetails, EngineResponse, Payload};
use crate::capability::{CapabilitySet, LanguagePair};
use crate::error::EngineError;

/// Returns the text unchanged. Handy for dry runs of a translation
/// pipeline.
///
/// With `{"languages": [["fr", "en"], ...]}` in its configuration it also
/// answers capability queries with those pairs.
#[derive(Debug, Default)]
pub struct EchoConnector {
    languages: Option<Vec<LanguagePair>>,
}

impl EchoConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Engine for EchoConnector {
    fn describe(&self) -> EngineDetails {
        EngineDetails::new("Echo Connector", env!("CARGO_PKG_VERSION"))
    }

    async fn configure(&mut self, config: &Configuration) -> Result<()> {
        self.languages = match config.get("languages") {
            None => None,
            Some(raw) => {
                let pairs: Vec<(String, String)> = serde_json::from_value(raw.clone())
                    .context("`languages` must be a list of [source, target] pairs")?;
                Some(
                    pairs
                        .into_iter()
                        .map(|(s, t)| LanguagePair::new(s, t))
                        .collect(),
                )
            }
        };
        Ok(())
    }

    fn queries_capabilities(&self) -> bool {
        self.languages.is_some()
    }

    async fn supported_operations(&self) -> Result<CapabilitySet, EngineError> {
        Ok(self
            .languages
            .iter()
            .flatten()
            .cloned()
            .collect())
    }

    async fn invoke(&self, payload: &Payload) -> Result<EngineResponse, EngineError> {
        match payload {
            Payload::Translation(req) => Ok(EngineResponse::new(req.content.as_bytes())
                .with_metadata("source_language", &req.source_language)
                .with_metadata("target_language", &req.target_language)),
            other => Err(EngineError::failed(format!(
                "echo connector can't handle {} requests",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TranslationRequest;

    fn request() -> Payload {
        Payload::Translation(TranslationRequest {
            source_language: "fr".to_string(),
            target_language: "en".to_string(),
            content: "Bonjour".to_string(),
        })
    }

    #[tokio::test]
    async fn echoes_content() {
        let mut echo = EchoConnector::new();
        echo.configure(&Configuration::default()).await.unwrap();
        let resp = echo.invoke(&request()).await.unwrap();
        assert_eq!(resp.content, b"Bonjour");
        assert_eq!(resp.metadata["source_language"], "fr");
    }

    #[tokio::test]
    async fn no_languages_means_no_capability_queries() {
        let mut echo = EchoConnector::new();
        echo.configure(&Configuration::default()).await.unwrap();
        assert!(!echo.queries_capabilities());
    }

    #[tokio::test]
    async fn languages_enable_capability_queries() {
        let mut echo = EchoConnector::new();
        let config = Configuration::from_json_str(r#"{"languages":[["fr","en"],["de","en"]]}"#)
            .unwrap();
        echo.configure(&config).await.unwrap();
        assert!(echo.queries_capabilities());
        let caps = echo.supported_operations().await.unwrap();
        assert_eq!(caps.len(), 2);
        assert!(caps.contains(&LanguagePair::new("de", "en")));
    }

    #[tokio::test]
    async fn malformed_languages_rejected() {
        let mut echo = EchoConnector::new();
        let config = Configuration::from_json_str(r#"{"languages":"fr-en"}"#).unwrap();
        assert!(echo.configure(&config).await.is_err());
    }

    #[tokio::test]
    async fn reconfigure_without_languages_clears_them() {
        let mut echo = EchoConnector::new();
        let with = Configuration::from_json_str(r#"{"languages":[["fr","en"]]}"#).unwrap();
        echo.configure(&with).await.unwrap();
        echo.configure(&Configuration::default()).await.unwrap();
        assert!(!echo.queries_capabilities());
    }
}
