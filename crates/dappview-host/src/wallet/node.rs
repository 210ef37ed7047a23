//! Accounts managed by the node behind the active chain's RPC URL

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use dappview_core::models::{ChainDefinition, TransactionRequest};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{ChainRegistry, Result, Signer, UpstreamError, WalletConnector};
use crate::upstream::http::{active_rpc_url, JsonRpcHttp};

/// Connects to one of the node's unlocked accounts.
pub struct NodeWallet {
    rpc: Arc<JsonRpcHttp>,
    registry: Arc<dyn ChainRegistry>,
    account: Option<String>,
}

impl NodeWallet {
    pub fn new(
        rpc: Arc<JsonRpcHttp>,
        registry: Arc<dyn ChainRegistry>,
        account: Option<String>,
    ) -> Self {
        Self {
            rpc,
            registry,
            account,
        }
    }
}

#[async_trait]
impl WalletConnector for NodeWallet {
    async fn connect(&self, chain: &ChainDefinition) -> Result<Arc<dyn Signer>> {
        let url = chain
            .primary_rpc_url()
            .ok_or(UpstreamError::UnknownChain(chain.chain_id))?;
        let accounts: Vec<Address> = self.rpc.call(url, "eth_accounts", json!([])).await?;

        let address = select_account(&accounts, self.account.as_deref())?;
        tracing::info!("Node account {} selected on chain {}", address, chain.chain_id);

        Ok(Arc::new(NodeSigner {
            rpc: self.rpc.clone(),
            registry: self.registry.clone(),
            address,
        }))
    }
}

/// Configured account if the node has it, otherwise the node's first account.
fn select_account(accounts: &[Address], wanted: Option<&str>) -> Result<Address> {
    match wanted {
        Some(wanted) => {
            let wanted: Address = wanted
                .parse()
                .map_err(|_| UpstreamError::InvalidResponse(format!("Invalid account: {}", wanted)))?;
            accounts
                .iter()
                .copied()
                .find(|a| *a == wanted)
                .ok_or(UpstreamError::NoAccount)
        }
        None => accounts.first().copied().ok_or(UpstreamError::NoAccount),
    }
}

/// Signs through the node, always against the chain that is active at call time.
pub struct NodeSigner {
    rpc: Arc<JsonRpcHttp>,
    registry: Arc<dyn ChainRegistry>,
    address: Address,
}

impl NodeSigner {
    async fn request<T: serde::de::DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let url = active_rpc_url(self.registry.as_ref()).await?;
        self.rpc.call(&url, method, params).await
    }
}

#[async_trait]
impl Signer for NodeSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    async fn sign_message(&self, message: &Bytes) -> Result<Bytes> {
        self.request("personal_sign", json!([message, self.address]))
            .await
    }

    async fn sign_typed_data(&self, typed_data: &Value) -> Result<Bytes> {
        let encoded = serde_json::to_string(typed_data)
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;
        self.request("eth_signTypedData_v4", json!([self.address, encoded]))
            .await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256> {
        self.request("eth_estimateGas", json!([tx])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> Vec<Address> {
        vec![
            "0x1111110000000000000000000000000000000000".parse().unwrap(),
            "0xABCDEF0000000000000000000000000000000000".parse().unwrap(),
        ]
    }

    #[test]
    fn test_select_first_account() {
        assert_eq!(select_account(&accounts(), None).unwrap(), accounts()[0]);
    }

    #[test]
    fn test_select_configured_account_any_case() {
        let selected =
            select_account(&accounts(), Some("0xabcdef0000000000000000000000000000000000")).unwrap();
        assert_eq!(selected, accounts()[1]);
    }

    #[test]
    fn test_select_missing_account() {
        assert!(matches!(
            select_account(&accounts(), Some("0x2222220000000000000000000000000000000000")),
            Err(UpstreamError::NoAccount)
        ));
        assert!(matches!(select_account(&[], None), Err(UpstreamError::NoAccount)));
    }
}
