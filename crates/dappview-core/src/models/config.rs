//! Application configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

use super::chain::{default_chains, ChainDefinition};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub host: HostConfig,
    pub chains: Vec<ChainDefinition>,
    pub default_chain_id: u64,
    #[serde(default = "default_client_version")]
    pub client_version: String,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub receipt: ReceiptConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    pub socket_path: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WalletConfig {
    /// Account to use from the node's managed accounts. First account when unset.
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecoderConfig {
    pub url: Option<String>,
    pub timeout_ms: u64,
}

/// Polling policy for `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiptConfig {
    pub attempts: u32,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GateConfig {
    /// Reject pending confirmations after this many seconds. Disabled when unset.
    pub timeout_secs: Option<u64>,
}

fn default_client_version() -> String {
    format!("dappview/v{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.host.validate()?;

        if self.chains.is_empty() {
            return Err(Error::Validation("At least one chain is required".to_string()));
        }

        for chain in &self.chains {
            chain.validate()?;
        }

        if !self.chains.iter().any(|c| c.chain_id == self.default_chain_id) {
            return Err(Error::Validation(format!(
                "Default chain {} is not configured",
                self.default_chain_id
            )));
        }

        self.decoder.validate()?;
        self.receipt.validate()?;
        self.gate.validate()?;
        Ok(())
    }

    pub fn default_chain(&self) -> Option<&ChainDefinition> {
        self.chains
            .iter()
            .find(|c| c.chain_id == self.default_chain_id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            host: HostConfig::default(),
            chains: default_chains(),
            default_chain_id: 1,
            client_version: default_client_version(),
            wallet: WalletConfig::default(),
            decoder: DecoderConfig::default(),
            receipt: ReceiptConfig::default(),
            gate: GateConfig::default(),
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.trim().is_empty() {
            return Err(Error::Validation("Socket path cannot be empty".to_string()));
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(Error::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        Ok(())
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/dappview.sock".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Validation(format!(
                    "Decoder URL must be http(s): {}",
                    url
                )));
            }
        }
        if self.timeout_ms == 0 {
            return Err(Error::Validation(
                "Decoder timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 5000,
        }
    }
}

impl ReceiptConfig {
    pub fn validate(&self) -> Result<()> {
        if self.attempts == 0 {
            return Err(Error::Validation(
                "Receipt attempts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval_ms: 5000,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == Some(0) {
            return Err(Error::Validation(
                "Gate timeout must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.receipt.attempts, 10);
        assert_eq!(config.receipt.interval_ms, 5000);
        assert_eq!(config.default_chain().unwrap().chain_id, 1);
    }

    #[test]
    fn test_unknown_default_chain() {
        let config = Config {
            default_chain_id: 999,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.host.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_gate_timeout_rejected() {
        let mut config = Config::default();
        config.gate.timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "version": "1.0.0",
            "host": {"socket_path": "/tmp/x.sock", "log_level": "debug"},
            "chains": [{
                "chain_id": 31337,
                "chain_name": "Anvil",
                "rpc_urls": ["http://127.0.0.1:8545"],
                "native_currency": {"name": "Ether", "symbol": "ETH", "decimals": 18}
            }],
            "default_chain_id": 31337
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.receipt, ReceiptConfig::default());
        assert!(config.gate.timeout_secs.is_none());
        assert!(config.client_version.starts_with("dappview/"));
    }
}
