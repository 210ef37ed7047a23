//! Collaborators the bridge drives: chain RPC, signer, chain registry and
//! calldata decoder.

pub mod node;
pub mod registry;
pub mod session;

pub use node::{NodeSigner, NodeWallet};
pub use registry::InMemoryChainRegistry;
pub use session::WalletSession;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use dappview_core::models::{
    ChainDefinition, DecodedTransaction, TransactionReceipt, TransactionRequest,
};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    #[error("Transaction receipt not found")]
    ReceiptNotFound,

    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("Unrecognized chain: {0}")]
    UnknownChain(u64),

    #[error("No account available")]
    NoAccount,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Http(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Read access to the active chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn gas_price(&self) -> Result<U256>;
    async fn get_balance(&self, address: Address, block: &Value) -> Result<U256>;
    async fn block_number(&self) -> Result<u64>;
    async fn call(&self, tx: &TransactionRequest, block: &Value) -> Result<Bytes>;
    async fn get_code(&self, address: Address, block: &Value) -> Result<Bytes>;
    async fn get_storage_at(&self, address: Address, slot: U256, block: &Value) -> Result<B256>;
    async fn get_block_by_number(&self, block: &Value, full: bool) -> Result<Option<Value>>;
    async fn get_block_by_hash(&self, hash: B256, full: bool) -> Result<Option<Value>>;
    async fn get_transaction_by_hash(&self, hash: B256) -> Result<Option<Value>>;
    /// Fails with [`UpstreamError::ReceiptNotFound`] while the transaction is unmined.
    async fn get_transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt>;
    async fn get_transaction_count(&self, address: Address, block: &Value) -> Result<u64>;
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256>;
}

/// The connected account.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256>;
    async fn sign_message(&self, message: &Bytes) -> Result<Bytes>;
    async fn sign_typed_data(&self, typed_data: &Value) -> Result<Bytes>;
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256>;
}

/// Establishes the wallet connection after the user approves it.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    async fn connect(&self, chain: &ChainDefinition) -> Result<Arc<dyn Signer>>;
}

#[async_trait]
pub trait ChainRegistry: Send + Sync {
    async fn active_chain(&self) -> ChainDefinition;
    async fn get(&self, chain_id: u64) -> Option<ChainDefinition>;
    /// Register chains, replacing definitions with the same id.
    async fn define_chains(&self, chains: Vec<ChainDefinition>) -> Result<()>;
    async fn switch_active_chain(&self, chain_id: u64) -> Result<ChainDefinition>;
}

/// Best-effort calldata decoding for display.
#[async_trait]
pub trait TxDecoder: Send + Sync {
    async fn decode(&self, calldata: &Bytes) -> Result<DecodedTransaction>;
}
