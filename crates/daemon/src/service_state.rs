use std::sync::Arc;

use common::manager::{Manager, ManagerConfig, ParanoidError};
use common::store::{MemoryBackend, RemoteStore};

use crate::keybase::{KeybaseClient, KeybaseError};
use crate::service_config::Config;
use crate::state::StoreConfig;

/// Main service state, shared by every request handler
#[derive(Debug, Clone)]
pub struct State {
    manager: Manager,
}

impl State {
    /// Connect to the configured store and make sure its layout exists.
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let store: Arc<dyn RemoteStore> = match &config.store {
            StoreConfig::Keybase { binary } => {
                tracing::info!(binary = %binary.display(), "using keybase store");
                Arc::new(KeybaseClient::connect(binary.clone(), config.base_path.clone()).await?)
            }
            StoreConfig::Memory { username } => {
                tracing::warn!(username = %username, "using in-memory store, nothing will be persisted");
                Arc::new(MemoryBackend::new().client(username.clone()))
            }
        };

        let manager = Manager::new(
            store,
            ManagerConfig {
                disable_chat: config.disable_chat,
            },
        );
        manager.init_layout().await?;

        Ok(Self { manager })
    }

    pub fn from_manager(manager: Manager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("keybase error: {0}")]
    Keybase(#[from] KeybaseError),
    #[error("failed to initialize store layout: {0}")]
    Layout(#[from] ParanoidError),
}
