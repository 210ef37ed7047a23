//! In-memory collaborators for unit tests

use alloy_primitives::{address, Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use dappview_core::models::{
    chain::default_chains, ChainDefinition, DecodedTransaction, TransactionReceipt,
    TransactionRequest,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::upstream::Upstream;
use crate::wallet::{
    ChainClient, ChainRegistry, InMemoryChainRegistry, Result, Signer, TxDecoder, UpstreamError,
    WalletConnector,
};

pub const TX_HASH: B256 = B256::repeat_byte(0xab);

/// Chain client that counts every call it serves.
pub struct MockChainClient {
    pub calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    /// Attempt on which the receipt shows up. Never when unset.
    pub receipt_on_attempt: Option<usize>,
    pub fail_gas_price: AtomicBool,
    pub fail_receipt: AtomicBool,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            receipt_on_attempt: None,
            fail_gas_price: AtomicBool::new(false),
            fail_receipt: AtomicBool::new(false),
        }
    }

    pub fn with_receipt_on_attempt(attempt: usize) -> Self {
        Self {
            receipt_on_attempt: Some(attempt),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn receipt(hash: B256) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: hash,
        transaction_index: U64::from(0),
        block_hash: B256::repeat_byte(0x01),
        block_number: U64::from(19_000_000u64),
        from: MockSigner::default_address(),
        to: Some(address!("1111110000000000000000000000000000000000")),
        cumulative_gas_used: U256::from(21_000u64),
        gas_used: U256::from(21_000u64),
        effective_gas_price: Some(U256::from(1_000_000_000u64)),
        contract_address: None,
        logs: Vec::new(),
        logs_bloom: None,
        status: Some(U64::from(1)),
        tx_type: Some(U64::from(2)),
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn gas_price(&self) -> Result<U256> {
        self.hit();
        if self.fail_gas_price.load(Ordering::SeqCst) {
            return Err(UpstreamError::Rpc {
                code: -32000,
                message: "gas price unavailable".to_string(),
            });
        }
        Ok(U256::from(1_000_000_000u64))
    }

    async fn get_balance(&self, _address: Address, _block: &Value) -> Result<U256> {
        self.hit();
        Ok(U256::from(1_000_000_000_000_000_000u128))
    }

    async fn block_number(&self) -> Result<u64> {
        self.hit();
        Ok(19_000_000)
    }

    async fn call(&self, _tx: &TransactionRequest, _block: &Value) -> Result<Bytes> {
        self.hit();
        Ok(Bytes::from_static(&[0x00, 0x01]))
    }

    async fn get_code(&self, _address: Address, _block: &Value) -> Result<Bytes> {
        self.hit();
        Ok(Bytes::new())
    }

    async fn get_storage_at(&self, _address: Address, _slot: U256, _block: &Value) -> Result<B256> {
        self.hit();
        Ok(B256::ZERO)
    }

    async fn get_block_by_number(&self, block: &Value, _full: bool) -> Result<Option<Value>> {
        self.hit();
        Ok(Some(serde_json::json!({ "number": block })))
    }

    async fn get_block_by_hash(&self, _hash: B256, _full: bool) -> Result<Option<Value>> {
        self.hit();
        Ok(None)
    }

    async fn get_transaction_by_hash(&self, _hash: B256) -> Result<Option<Value>> {
        self.hit();
        Ok(None)
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        self.hit();
        let attempt = self.receipt_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_receipt.load(Ordering::SeqCst) {
            return Err(UpstreamError::Rpc {
                code: -32005,
                message: "rate limited".to_string(),
            });
        }
        match self.receipt_on_attempt {
            Some(on) if attempt >= on => Ok(receipt(hash)),
            _ => Err(UpstreamError::ReceiptNotFound),
        }
    }

    async fn get_transaction_count(&self, _address: Address, _block: &Value) -> Result<u64> {
        self.hit();
        Ok(7)
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<U256> {
        self.hit();
        Ok(U256::from(21_000u64))
    }
}

pub struct MockSigner {
    address: Address,
    pub fail_estimate: bool,
    pub sent: Mutex<Vec<TransactionRequest>>,
    pub signed: AtomicUsize,
}

impl MockSigner {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            fail_estimate: false,
            sent: Mutex::new(Vec::new()),
            signed: AtomicUsize::new(0),
        }
    }

    pub fn default_address() -> Address {
        address!("ABCDEF0000000000000000000000000000000000")
    }

    pub fn last_sent(&self) -> Option<TransactionRequest> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Signer for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256> {
        self.sent.lock().unwrap().push(tx.clone());
        Ok(TX_HASH)
    }

    async fn sign_message(&self, _message: &Bytes) -> Result<Bytes> {
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(vec![0x11; 65]))
    }

    async fn sign_typed_data(&self, _typed_data: &Value) -> Result<Bytes> {
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(vec![0x22; 65]))
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<U256> {
        if self.fail_estimate {
            return Err(UpstreamError::Rpc {
                code: -32000,
                message: "execution reverted".to_string(),
            });
        }
        Ok(U256::from(55_555u64))
    }
}

/// Hands out the same signer on every connect.
pub struct MockConnector {
    pub signer: Arc<MockSigner>,
    pub connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(signer: Arc<MockSigner>) -> Self {
        Self {
            signer,
            connects: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WalletConnector for MockConnector {
    async fn connect(&self, _chain: &ChainDefinition) -> Result<Arc<dyn Signer>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.signer.clone())
    }
}

pub struct MockDecoder;

#[async_trait]
impl TxDecoder for MockDecoder {
    async fn decode(&self, calldata: &Bytes) -> Result<DecodedTransaction> {
        if calldata.len() < 4 {
            return Err(UpstreamError::InvalidResponse("short calldata".to_string()));
        }
        Ok(DecodedTransaction {
            function_name: "transfer".to_string(),
            params: Vec::new(),
            extra_decoded: None,
        })
    }
}

/// Mocks behind the trait objects the dispatcher consumes.
pub struct MockUpstream {
    pub chain: Arc<MockChainClient>,
    pub signer: Arc<MockSigner>,
    pub connector: Arc<MockConnector>,
    pub registry: Arc<InMemoryChainRegistry>,
}

impl MockUpstream {
    pub fn new(chain: MockChainClient, signer: MockSigner) -> Self {
        let signer = Arc::new(signer);
        let registry = Arc::new(InMemoryChainRegistry::new(default_chains(), 1).unwrap());
        Self {
            chain: Arc::new(chain),
            connector: Arc::new(MockConnector::new(signer.clone())),
            signer,
            registry,
        }
    }

    pub fn upstream(&self) -> Upstream {
        let registry: Arc<dyn ChainRegistry> = self.registry.clone();
        Upstream {
            chain: self.chain.clone(),
            registry,
            connector: self.connector.clone(),
            decoder: Arc::new(MockDecoder),
        }
    }
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new(
            MockChainClient::new(),
            MockSigner::new(MockSigner::default_address()),
        )
    }
}
