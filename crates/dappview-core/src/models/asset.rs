//! `wallet_watchAsset` payloads

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchAssetRequest {
    #[serde(rename = "type")]
    pub asset_type: String,
    pub options: WatchedAsset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedAsset {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl WatchAssetRequest {
    /// Validate and extract a watch-asset request. Each required field is
    /// checked by name so the page learns which one is missing.
    pub fn from_value(value: &Value) -> Result<Self> {
        let asset_type = value
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Validation("Missing asset type".to_string()))?;

        let options = value
            .get("options")
            .filter(|o| o.is_object())
            .ok_or_else(|| Error::Validation("Missing asset options".to_string()))?;

        let address = required_str(options, "address")?;
        let symbol = required_str(options, "symbol")?;
        let decimals = match options.get("decimals") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
        .ok_or_else(|| Error::Validation("Missing or invalid options.decimals".to_string()))?;

        let decimals = u8::try_from(decimals)
            .map_err(|_| Error::Validation(format!("Decimals out of range: {}", decimals)))?;

        let image = options
            .get("image")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            asset_type: asset_type.to_string(),
            options: WatchedAsset {
                address: address.to_string(),
                symbol: symbol.to_string(),
                decimals,
                image,
            },
        })
    }
}

impl WatchedAsset {
    pub fn same_address(&self, other: &str) -> bool {
        self.address.eq_ignore_ascii_case(other)
    }
}

fn required_str<'a>(options: &'a Value, field: &str) -> Result<&'a str> {
    options
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::Validation(format!("Missing options.{}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_watch_asset() {
        let req = WatchAssetRequest::from_value(&json!({
            "type": "ERC20",
            "options": {"address": "0xA0b8", "symbol": "USDC", "decimals": 6, "image": "https://x/usdc.png"}
        }))
        .unwrap();

        assert_eq!(req.asset_type, "ERC20");
        assert_eq!(req.options.decimals, 6);
        assert_eq!(req.options.image.as_deref(), Some("https://x/usdc.png"));
    }

    #[test]
    fn test_decimals_as_string() {
        let req = WatchAssetRequest::from_value(&json!({
            "type": "ERC20",
            "options": {"address": "0xA0b8", "symbol": "DAI", "decimals": "18"}
        }))
        .unwrap();
        assert_eq!(req.options.decimals, 18);
    }

    #[test]
    fn test_missing_decimals() {
        let err = WatchAssetRequest::from_value(&json!({
            "type": "ERC20",
            "options": {"address": "0x..", "symbol": "X"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("decimals"));
    }

    #[test]
    fn test_missing_type_and_options() {
        assert!(WatchAssetRequest::from_value(&json!({"options": {}})).is_err());
        assert!(WatchAssetRequest::from_value(&json!({"type": "ERC20"})).is_err());
    }

    #[test]
    fn test_same_address_ignores_case() {
        let asset = WatchedAsset {
            address: "0xABCDEF".to_string(),
            symbol: "X".to_string(),
            decimals: 18,
            image: None,
        };
        assert!(asset.same_address("0xabcdef"));
        assert!(!asset.same_address("0xabcdee"));
    }
}
