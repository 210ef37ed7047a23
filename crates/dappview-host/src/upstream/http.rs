//! JSON-RPC over HTTP against the active chain's node

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use dappview_core::models::{Request, RequestId, Response, TransactionReceipt, TransactionRequest};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::wallet::{ChainClient, ChainRegistry, Result, UpstreamError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 2;

/// Minimal JSON-RPC 2.0 client shared by the chain client and the node signer.
pub struct JsonRpcHttp {
    client: reqwest::Client,
    next_id: AtomicI64,
}

impl JsonRpcHttp {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            next_id: AtomicI64::new(1),
        })
    }

    pub async fn call<T: DeserializeOwned>(&self, url: &str, method: &str, params: Value) -> Result<T> {
        let value = self.call_value(url, method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| UpstreamError::InvalidResponse(format!("{}: {}", method, e)))
    }

    pub async fn call_value(&self, url: &str, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request::new(method, Some(params), RequestId::Number(id));
        tracing::debug!("upstream -> {} {}", url, method);

        let mut attempt = 0u32;
        loop {
            let res = self.client.post(url).json(&request).send().await?;
            let status = res.status();

            if status.is_success() {
                let response: Response = res
                    .json()
                    .await
                    .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;
                return response.into_result().map_err(|e| UpstreamError::Rpc {
                    code: e.code,
                    message: e.message,
                });
            }

            // Retry only on transient statuses
            if matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504) && attempt < MAX_RETRIES {
                attempt += 1;
                tracing::warn!("upstream {} returned {}, retrying", method, status);
                tokio::time::sleep(Duration::from_millis(150 * attempt as u64)).await;
                continue;
            }

            return Err(UpstreamError::Http(format!("{} returned {}", url, status)));
        }
    }
}

/// First RPC URL of the chain the registry currently marks active.
pub async fn active_rpc_url(registry: &dyn ChainRegistry) -> Result<String> {
    let chain = registry.active_chain().await;
    chain
        .primary_rpc_url()
        .map(str::to_string)
        .ok_or(UpstreamError::UnknownChain(chain.chain_id))
}

pub struct HttpChainClient {
    rpc: Arc<JsonRpcHttp>,
    registry: Arc<dyn ChainRegistry>,
}

impl HttpChainClient {
    pub fn new(rpc: Arc<JsonRpcHttp>, registry: Arc<dyn ChainRegistry>) -> Self {
        Self { rpc, registry }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let url = active_rpc_url(self.registry.as_ref()).await?;
        self.rpc.call(&url, method, params).await
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn gas_price(&self) -> Result<U256> {
        self.request("eth_gasPrice", json!([])).await
    }

    async fn get_balance(&self, address: Address, block: &Value) -> Result<U256> {
        self.request("eth_getBalance", json!([address, block])).await
    }

    async fn block_number(&self) -> Result<u64> {
        let number: U64 = self.request("eth_blockNumber", json!([])).await?;
        Ok(number.to::<u64>())
    }

    async fn call(&self, tx: &TransactionRequest, block: &Value) -> Result<Bytes> {
        self.request("eth_call", json!([tx, block])).await
    }

    async fn get_code(&self, address: Address, block: &Value) -> Result<Bytes> {
        self.request("eth_getCode", json!([address, block])).await
    }

    async fn get_storage_at(&self, address: Address, slot: U256, block: &Value) -> Result<B256> {
        self.request("eth_getStorageAt", json!([address, slot, block]))
            .await
    }

    async fn get_block_by_number(&self, block: &Value, full: bool) -> Result<Option<Value>> {
        self.request("eth_getBlockByNumber", json!([block, full])).await
    }

    async fn get_block_by_hash(&self, hash: B256, full: bool) -> Result<Option<Value>> {
        self.request("eth_getBlockByHash", json!([hash, full])).await
    }

    async fn get_transaction_by_hash(&self, hash: B256) -> Result<Option<Value>> {
        self.request("eth_getTransactionByHash", json!([hash])).await
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        let receipt: Option<TransactionReceipt> =
            self.request("eth_getTransactionReceipt", json!([hash])).await?;
        receipt.ok_or(UpstreamError::ReceiptNotFound)
    }

    async fn get_transaction_count(&self, address: Address, block: &Value) -> Result<u64> {
        let count: U64 = self
            .request("eth_getTransactionCount", json!([address, block]))
            .await?;
        Ok(count.to::<u64>())
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256> {
        self.request("eth_estimateGas", json!([tx])).await
    }
}
