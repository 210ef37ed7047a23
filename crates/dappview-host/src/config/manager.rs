//! Configuration manager

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use dappview_core::{
    models::Config,
    storage::{init_config_dir, ConfigStorage},
    Result as CoreResult,
};

/// Config manager error
#[derive(Debug, thiserror::Error)]
pub enum ConfigManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] dappview_core::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigManagerError>;

/// Holds the loaded configuration
pub struct ConfigManager {
    storage: ConfigStorage,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// Load `config.json` from the user config directory, creating it if needed
    pub fn new() -> CoreResult<Self> {
        let config_dir = init_config_dir()?;
        Self::with_storage(ConfigStorage::new(config_dir))
    }

    pub fn with_storage(storage: ConfigStorage) -> CoreResult<Self> {
        let config = storage.load()?;

        Ok(Self {
            storage,
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub fn path(&self) -> &PathBuf {
        self.storage.path()
    }

    pub async fn get(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Apply command-line overrides for this run without persisting them
    pub async fn override_host(
        &self,
        socket_path: Option<String>,
        log_level: Option<String>,
    ) -> Result<Config> {
        let mut config = self.get().await;

        if let Some(path) = socket_path {
            config.host.socket_path = path;
        }
        if let Some(level) = log_level {
            config.host.log_level = level;
        }

        config
            .validate()
            .map_err(|e| ConfigManagerError::Invalid(e.to_string()))?;

        *self.config.write().await = config.clone();
        Ok(config)
    }
}
