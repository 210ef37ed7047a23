//! Configuration storage operations

use crate::{models::Config, Result};
use std::path::PathBuf;

pub struct ConfigStorage {
    config_path: PathBuf,
}

impl ConfigStorage {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_path: config_dir.join("config.json"),
        }
    }

    /// Storage backed by an explicit file instead of `<config_dir>/config.json`.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            let config = Config::default();
            self.save(&config)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&self.config_path)?;

        // Handle empty file case
        if content.trim().is_empty() {
            let config = Config::default();
            self.save(&config)?;
            return Ok(config);
        }

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().to_path_buf());

        let config = storage.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(temp_dir.path().join("config.json").exists());
    }

    #[test]
    fn test_empty_file_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.json");
        std::fs::write(&path, "   \n").unwrap();

        let storage = ConfigStorage::with_path(path);
        assert_eq!(storage.load().unwrap(), Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().to_path_buf());

        let mut config = Config::default();
        config.gate.timeout_secs = Some(45);
        storage.save(&config).unwrap();

        assert_eq!(storage.load().unwrap().gate.timeout_secs, Some(45));
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().to_path_buf());

        let mut config = Config::default();
        config.default_chain_id = 424242;
        storage.save(&config).unwrap();

        assert!(storage.load().is_err());
    }
}
