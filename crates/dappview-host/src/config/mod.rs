//! Configuration management

pub mod manager;

pub use manager::{ConfigManager, ConfigManagerError};
