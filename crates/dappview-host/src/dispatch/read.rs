//! Read-only delegation to the chain client

use alloy_primitives::{Address, B256, U256};
use dappview_core::models::TransactionRequest;
use serde_json::{json, Value};

use super::{block_param, parse_param, to_json, DispatchSettings, Result};
use crate::wallet::{ChainClient, UpstreamError};

pub(super) async fn gas_price(chain: &dyn ChainClient) -> Result<Value> {
    to_json(chain.gas_price().await?)
}

pub(super) async fn balance(chain: &dyn ChainClient, params: &[Value]) -> Result<Value> {
    let address: Address = parse_param(params, 0, "address")?;
    to_json(chain.get_balance(address, &block_param(params, 1)).await?)
}

pub(super) async fn block_number(chain: &dyn ChainClient) -> Result<Value> {
    Ok(json!(format!("{:#x}", chain.block_number().await?)))
}

pub(super) async fn call(chain: &dyn ChainClient, params: &[Value]) -> Result<Value> {
    let tx: TransactionRequest = parse_param(params, 0, "transaction")?;
    to_json(chain.call(&tx, &block_param(params, 1)).await?)
}

pub(super) async fn code(chain: &dyn ChainClient, params: &[Value]) -> Result<Value> {
    let address: Address = parse_param(params, 0, "address")?;
    to_json(chain.get_code(address, &block_param(params, 1)).await?)
}

pub(super) async fn storage_at(chain: &dyn ChainClient, params: &[Value]) -> Result<Value> {
    let address: Address = parse_param(params, 0, "address")?;
    let slot: U256 = parse_param(params, 1, "storage slot")?;
    to_json(
        chain
            .get_storage_at(address, slot, &block_param(params, 2))
            .await?,
    )
}

pub(super) async fn block_by_number(chain: &dyn ChainClient, params: &[Value]) -> Result<Value> {
    let full = params.get(1).and_then(Value::as_bool).unwrap_or(false);
    to_json(
        chain
            .get_block_by_number(&block_param(params, 0), full)
            .await?,
    )
}

pub(super) async fn block_by_hash(chain: &dyn ChainClient, params: &[Value]) -> Result<Value> {
    let hash: B256 = parse_param(params, 0, "block hash")?;
    let full = params.get(1).and_then(Value::as_bool).unwrap_or(false);
    to_json(chain.get_block_by_hash(hash, full).await?)
}

pub(super) async fn transaction_by_hash(
    chain: &dyn ChainClient,
    params: &[Value],
) -> Result<Value> {
    let hash: B256 = parse_param(params, 0, "transaction hash")?;
    to_json(chain.get_transaction_by_hash(hash).await?)
}

pub(super) async fn transaction_count(chain: &dyn ChainClient, params: &[Value]) -> Result<Value> {
    let address: Address = parse_param(params, 0, "address")?;
    let count = chain
        .get_transaction_count(address, &block_param(params, 1))
        .await?;
    Ok(json!(format!("{:#x}", count)))
}

pub(super) async fn estimate_gas(chain: &dyn ChainClient, params: &[Value]) -> Result<Value> {
    let tx: TransactionRequest = parse_param(params, 0, "transaction")?;
    to_json(chain.estimate_gas(&tx).await?)
}

/// Poll until the receipt exists or the attempts run out. Only "not found"
/// is retried; exhausting the attempts yields `null`, not an error.
pub(super) async fn transaction_receipt(
    chain: &dyn ChainClient,
    settings: &DispatchSettings,
    params: &[Value],
) -> Result<Value> {
    let hash: B256 = parse_param(params, 0, "transaction hash")?;

    for attempt in 1..=settings.receipt_attempts {
        match chain.get_transaction_receipt(hash).await {
            Ok(receipt) => return to_json(receipt),
            Err(UpstreamError::ReceiptNotFound) => {
                tracing::debug!(
                    "Receipt for {} not found (attempt {}/{})",
                    hash,
                    attempt,
                    settings.receipt_attempts
                );
                if attempt < settings.receipt_attempts {
                    tokio::time::sleep(settings.receipt_interval).await;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Value::Null)
}
