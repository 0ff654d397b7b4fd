//! Identity -> engine factory lookup.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::consts::{DEFAULT_CONNECTOR, OPENOCR_IDENTITY};
use crate::engine::echo::EchoConnector;
use crate::engine::openocr::OpenOcrEngine;
use crate::engine::{Engine, EngineIdentity};
use crate::error::ConfigurationError;

/// Produces a fresh, unconfigured engine.
pub type EngineFactory = Arc<dyn Fn() -> Box<dyn Engine> + Send + Sync>;

/// Known engine implementations. RwLock allows runtime registration while
/// pipelines instantiate in parallel.
pub struct EngineRegistry {
    factories: RwLock<HashMap<EngineIdentity, EngineFactory>>,
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// A registry that already knows the engines shipped with the crate.
    pub async fn with_builtins() -> Self {
        let registry = Self::new();
        registry
            .register(DEFAULT_CONNECTOR, Arc::new(|| -> Box<dyn Engine> { Box::new(EchoConnector::new()) }))
            .await;
        registry
            .register(OPENOCR_IDENTITY, Arc::new(|| -> Box<dyn Engine> { Box::new(OpenOcrEngine::new()) }))
            .await;
        registry
    }

    /// Register or replace the factory for `identity`.
    pub async fn register(&self, identity: impl Into<EngineIdentity>, factory: EngineFactory) {
        self.factories.write().await.insert(identity.into(), factory);
    }

    pub async fn unregister(&self, identity: &EngineIdentity) {
        self.factories.write().await.remove(identity);
    }

    pub async fn instantiate(
        &self,
        identity: &EngineIdentity,
    ) -> Result<Box<dyn Engine>, ConfigurationError> {
        let factories = self.factories.read().await;
        match factories.get(identity) {
            Some(factory) => Ok(factory()),
            None => Err(ConfigurationError::InstantiationFailed {
                identity: identity.to_string(),
                reason: "no engine registered under this name".to_string(),
            }),
        }
    }

    /// Registered identities, sorted.
    pub async fn identities(&self) -> Vec<EngineIdentity> {
        let mut ids: Vec<_> = self.factories.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtins_registered() {
        let registry = EngineRegistry::with_builtins().await;
        let ids = registry.identities().await;
        assert_eq!(
            ids,
            vec![EngineIdentity::from("echo"), EngineIdentity::from("openocr")]
        );
    }

    #[tokio::test]
    async fn unknown_identity_fails() {
        let registry = EngineRegistry::new();
        let err = registry
            .instantiate(&EngineIdentity::from("HelloWorld"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConfigurationError::InstantiationFailed { .. }));
        assert!(err.to_string().contains("HelloWorld"));
    }

    #[tokio::test]
    async fn each_instantiate_is_fresh() {
        let registry = EngineRegistry::with_builtins().await;
        let id = EngineIdentity::from("echo");
        let a = registry.instantiate(&id).await.unwrap();
        let b = registry.instantiate(&id).await.unwrap();
        assert_eq!(a.describe(), b.describe());
    }

    #[tokio::test]
    async fn unregister_removes() {
        let registry = EngineRegistry::with_builtins().await;
        let id = EngineIdentity::from("echo");
        registry.unregister(&id).await;
        assert!(registry.instantiate(&id).await.is_err());
    }
}
