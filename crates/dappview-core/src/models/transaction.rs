//! Transaction request, receipt and decoded-calldata models

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, alias = "input", skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, alias = "gasLimit", skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U64>,
}

impl TransactionRequest {
    /// First four bytes of the calldata.
    pub fn selector(&self) -> Option<[u8; 4]> {
        let data = self.data.as_ref()?;
        if data.len() < 4 {
            return None;
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&data.as_ref()[..4]);
        Some(selector)
    }

    pub fn has_calldata(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
    }

    pub fn uses_dynamic_fees(&self) -> bool {
        self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some()
    }
}

/// Receipt as returned to the page: quantities hex-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub transaction_index: U64,
    pub block_hash: B256,
    pub block_number: U64,
    pub from: Address,
    pub to: Option<Address>,
    pub cumulative_gas_used: U256,
    pub gas_used: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_gas_price: Option<U256>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub logs: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_bloom: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<U64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<U64>,
}

/// Human-readable view of calldata, shown in the send-transaction modal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTransaction {
    pub function_name: String,
    #[serde(default)]
    pub params: Vec<DecodedParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_decoded: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecodedParam {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}
