//! Keeps exactly one engine ready and reconfigures it only when the
//! requested identity or configuration drifts.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::capability::{Admission, CapabilityMode, LanguagePair, admit};
use crate::engine::{Configuration, Engine, EngineDetails, EngineIdentity};
use crate::error::ConfigurationError;
use crate::registry::EngineRegistry;

/// The held engine plus the epoch of the configuration it was last given.
pub(crate) struct EngineSlot {
    pub(crate) engine: Box<dyn Engine>,
    pub(crate) epoch: u64,
}

/// A view of the engine as it was configured at one epoch.
///
/// Cheap to clone. Calls made through a handle whose epoch has since moved
/// on are refused by [`transport::invoke`](crate::transport::invoke).
#[derive(Clone)]
pub struct EngineHandle {
    identity: EngineIdentity,
    epoch: u64,
    details: EngineDetails,
    capabilities: Arc<CapabilityMode>,
    slot: Arc<RwLock<EngineSlot>>,
}

impl EngineHandle {
    pub fn identity(&self) -> &EngineIdentity {
        &self.identity
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn details(&self) -> &EngineDetails {
        &self.details
    }

    pub fn capabilities(&self) -> &CapabilityMode {
        &self.capabilities
    }

    pub fn admit(&self, requested: &LanguagePair) -> Admission {
        admit(&self.capabilities, requested)
    }

    pub(crate) fn slot(&self) -> &Arc<RwLock<EngineSlot>> {
        &self.slot
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("identity", &self.identity)
            .field("epoch", &self.epoch)
            .field("details", &self.details)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

struct Active {
    configuration: Configuration,
    handle: EngineHandle,
}

#[derive(Default)]
struct ManagerState {
    active: Option<Active>,
    epoch: u64,
}

pub struct EngineManager {
    registry: Arc<EngineRegistry>,
    state: Mutex<ManagerState>,
}

impl EngineManager {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            registry,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Return a handle to an engine of `identity` configured with
    /// `configuration`, doing as little work as possible:
    ///
    /// * nothing held, or a different identity: instantiate and configure;
    /// * same identity, different configuration: reconfigure in place;
    /// * otherwise: hand back the current handle.
    ///
    /// On any error the held engine is forgotten, so the next call starts
    /// from a fresh instance.
    pub async fn ensure_ready(
        &self,
        identity: &EngineIdentity,
        configuration: &Configuration,
    ) -> Result<EngineHandle, ConfigurationError> {
        let mut state = self.state.lock().await;

        if let Some(active) = &state.active {
            if active.handle.identity == *identity && active.configuration == *configuration {
                return Ok(active.handle.clone());
            }
        }

        state.epoch += 1;
        let epoch = state.epoch;
        let previous = state.active.take();

        let slot = match previous {
            Some(active) if active.handle.identity == *identity => {
                info!(engine = %identity, epoch, "configuration changed, reconfiguring");
                let slot = active.handle.slot;
                {
                    // Waits for in-flight calls to drain.
                    let mut guard = slot.write().await;
                    guard.epoch = epoch;
                    guard
                        .engine
                        .configure(configuration)
                        .await
                        .map_err(|e| configure_failed(identity, &e))?;
                }
                slot
            }
            other => {
                if let Some(old) = other {
                    info!(from = %old.handle.identity, to = %identity, "switching engine");
                    old.handle.slot.write().await.epoch = epoch;
                } else {
                    info!(engine = %identity, "instantiating engine");
                }
                let mut engine = self.registry.instantiate(identity).await?;
                engine
                    .configure(configuration)
                    .await
                    .map_err(|e| configure_failed(identity, &e))?;
                Arc::new(RwLock::new(EngineSlot { engine, epoch }))
            }
        };

        let (details, capabilities) = {
            let guard = slot.read().await;
            let capabilities = refresh_capabilities(identity, guard.engine.as_ref()).await?;
            (guard.engine.describe(), capabilities)
        };
        debug!(engine = %identity, ?capabilities, "engine ready");

        let handle = EngineHandle {
            identity: identity.clone(),
            epoch,
            details,
            capabilities: Arc::new(capabilities),
            slot,
        };
        state.active = Some(Active {
            configuration: configuration.clone(),
            handle: handle.clone(),
        });
        Ok(handle)
    }

    /// The handle last returned by [`ensure_ready`](Self::ensure_ready), if
    /// the engine is still held.
    pub async fn current(&self) -> Option<EngineHandle> {
        self.state
            .lock()
            .await
            .active
            .as_ref()
            .map(|a| a.handle.clone())
    }
}

fn configure_failed(identity: &EngineIdentity, err: &anyhow::Error) -> ConfigurationError {
    warn!(engine = %identity, error = %err, "engine rejected configuration");
    ConfigurationError::ConfigureFailed {
        identity: identity.to_string(),
        reason: format!("{err:#}"),
    }
}

async fn refresh_capabilities(
    identity: &EngineIdentity,
    engine: &dyn Engine,
) -> Result<CapabilityMode, ConfigurationError> {
    if !engine.queries_capabilities() {
        return Ok(CapabilityMode::Unchecked);
    }
    engine
        .supported_operations()
        .await
        .map(CapabilityMode::Checked)
        .map_err(|e| ConfigurationError::CapabilityQueryFailed {
            identity: identity.to_string(),
            reason: e.to_string(),
        })
}
