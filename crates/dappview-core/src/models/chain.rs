//! Chain definitions and chain-id encoding

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainDefinition {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameter object of `wallet_addEthereumChain`, as dApps send it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    pub chain_id: Value,
    #[serde(default)]
    pub chain_name: Option<String>,
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub native_currency: Option<NativeCurrency>,
    #[serde(default)]
    pub block_explorer_urls: Option<Vec<String>>,
}

impl ChainDefinition {
    pub fn new(chain_id: u64, chain_name: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        Self {
            chain_id,
            chain_name: chain_name.into(),
            rpc_urls: vec![rpc_url.into()],
            native_currency: NativeCurrency::ether(),
            block_explorer_urls: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain_id == 0 {
            return Err(Error::Validation("Chain id must be greater than 0".to_string()));
        }

        if self.chain_name.trim().is_empty() {
            return Err(Error::Validation("Chain name cannot be empty".to_string()));
        }

        if self.rpc_urls.is_empty() {
            return Err(Error::Validation(format!(
                "Chain {} has no RPC URL",
                self.chain_id
            )));
        }

        for url in &self.rpc_urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Validation(format!(
                    "RPC URL must be http(s): {}",
                    url
                )));
            }
        }

        Ok(())
    }

    pub fn hex_chain_id(&self) -> String {
        to_hex_chain_id(self.chain_id)
    }

    pub fn primary_rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }
}

impl NativeCurrency {
    pub fn ether() -> Self {
        Self {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

impl TryFrom<AddEthereumChainParameter> for ChainDefinition {
    type Error = Error;

    fn try_from(param: AddEthereumChainParameter) -> Result<Self> {
        let chain_id = parse_chain_id(&param.chain_id)?;
        let definition = Self {
            chain_id,
            chain_name: param
                .chain_name
                .unwrap_or_else(|| format!("Chain {}", chain_id)),
            rpc_urls: param.rpc_urls,
            native_currency: param.native_currency.unwrap_or_else(NativeCurrency::ether),
            block_explorer_urls: param.block_explorer_urls.unwrap_or_default(),
        };
        definition.validate()?;
        Ok(definition)
    }
}

/// Parse a chain id given as `"0x89"`, `"137"` or `137`.
pub fn parse_chain_id(value: &Value) -> Result<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| Error::InvalidData(format!("Invalid chain id: {}", n))),
        Value::String(s) => parse_quantity(s),
        other => Err(Error::InvalidData(format!("Invalid chain id: {}", other))),
    }
}

/// Parse a `0x`-prefixed hex or plain decimal quantity.
pub fn parse_quantity(s: &str) -> Result<u64> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|_| Error::InvalidData(format!("Invalid quantity: {}", s)))
}

pub fn to_hex_chain_id(chain_id: u64) -> String {
    format!("{:#x}", chain_id)
}

pub fn default_chains() -> Vec<ChainDefinition> {
    vec![
        ChainDefinition {
            block_explorer_urls: vec!["https://etherscan.io".to_string()],
            ..ChainDefinition::new(1, "Ethereum", "https://cloudflare-eth.com")
        },
        ChainDefinition {
            native_currency: NativeCurrency {
                name: "POL".to_string(),
                symbol: "POL".to_string(),
                decimals: 18,
            },
            block_explorer_urls: vec!["https://polygonscan.com".to_string()],
            ..ChainDefinition::new(137, "Polygon", "https://polygon-rpc.com")
        },
        ChainDefinition {
            block_explorer_urls: vec!["https://basescan.org".to_string()],
            ..ChainDefinition::new(8453, "Base", "https://mainnet.base.org")
        },
    ]
}
