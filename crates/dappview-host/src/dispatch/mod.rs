//! Request dispatcher: one page request in, exactly one response out

mod account;
mod asset;
mod chain;
mod read;
mod sign;
mod transaction;

pub use transaction::heuristic_gas_limit;

use alloy_primitives::Address;
use dappview_core::models::{Config, HostMessage, Request, Response, RpcError};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::event_manager::EventManager;
use crate::gate::{GateKind, GateManager, GateOutcome, RejectReason};
use crate::tab::{PageContext, TabManager};
use crate::upstream::Upstream;
use crate::wallet::{Signer, UpstreamError, WalletSession};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Method not supported: {0}")]
    MethodNotSupported(String),

    #[error("{0}")]
    InvalidParams(String),

    #[error("No account available")]
    NoAccount,

    #[error("Address mismatch: requested {requested}, active account is {active}")]
    AddressMismatch { requested: Address, active: Address },

    #[error("{}", rejection_message(.kind, .reason))]
    Rejected { kind: GateKind, reason: RejectReason },

    #[error("{0}")]
    UnrecognizedChain(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;

fn rejection_message(kind: &GateKind, reason: &RejectReason) -> String {
    match reason {
        RejectReason::User => format!("User rejected {}", kind.action()),
        other => format!("User rejected {} ({})", kind.action(), other),
    }
}

impl DispatchError {
    /// Page-facing error object.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            DispatchError::MethodNotSupported(_) => RpcError::method_not_supported(),
            DispatchError::InvalidParams(message) => RpcError::invalid_params(message.clone()),
            DispatchError::UnrecognizedChain(message) => {
                RpcError::unrecognized_chain(message.clone())
            }
            DispatchError::Rejected {
                kind: GateKind::SwitchChain | GateKind::AddChain,
                ..
            } => RpcError::unrecognized_chain(self.to_string()),
            _ => RpcError::internal_error(self.to_string()),
        }
    }
}

/// Methods that cannot run without a connected signer.
const SIGNER_METHODS: &[&str] = &[
    "eth_sendTransaction",
    "personal_sign",
    "eth_signTypedData",
    "eth_signTypedData_v3",
    "eth_signTypedData_v4",
];

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub client_version: String,
    pub receipt_attempts: u32,
    pub receipt_interval: Duration,
}

impl DispatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_version: config.client_version.clone(),
            receipt_attempts: config.receipt.attempts,
            receipt_interval: Duration::from_millis(config.receipt.interval_ms),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct Dispatcher {
    upstream: Upstream,
    session: Arc<WalletSession>,
    gates: Arc<GateManager>,
    tabs: Arc<TabManager>,
    event_manager: Arc<EventManager>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        upstream: Upstream,
        session: Arc<WalletSession>,
        gates: Arc<GateManager>,
        tabs: Arc<TabManager>,
        event_manager: Arc<EventManager>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            upstream,
            session,
            gates,
            tabs,
            event_manager,
            settings,
        }
    }

    /// Answer one request from `page`. Never fails: every error becomes a
    /// JSON-RPC error response carrying the request id.
    pub async fn dispatch(&self, page: &PageContext, request: &Request) -> Response {
        let id = request.id.clone();
        match self.route(page, request).await {
            Ok(result) => Response::success(result, id),
            Err(e) => {
                tracing::debug!("{} from tab {} failed: {}", request.method, page.tab_id, e);
                Response::error(e.to_rpc_error(), id)
            }
        }
    }

    async fn route(&self, page: &PageContext, request: &Request) -> Result<Value> {
        let method = request.method.as_str();
        let params = request.params_array();
        tracing::debug!("Dispatching {} for tab {}", method, page.tab_id);

        if SIGNER_METHODS.contains(&method) && !self.session.is_connected().await {
            return Err(DispatchError::NoAccount);
        }

        let chain = self.upstream.chain.as_ref();
        match method {
            // Permissions and session
            "wallet_requestPermissions" | "wallet_getPermissions" => {
                Ok(account::permissions(&self.session).await)
            }
            "wallet_revokePermissions" => account::revoke(self).await,
            "eth_accounts" => Ok(account::accounts(&self.session).await),
            "eth_requestAccounts" => account::request_accounts(self, page).await,

            // Chain identity and switching
            "eth_chainId" => Ok(chain::chain_id(self.upstream.registry.as_ref()).await),
            "net_version" => Ok(chain::net_version(self.upstream.registry.as_ref()).await),
            "wallet_switchEthereumChain" => chain::switch(self, page, &params).await,
            "wallet_addEthereumChain" => chain::add(self, page, &params).await,
            "web3_clientVersion" => Ok(json!(self.settings.client_version)),

            // Reads
            "eth_gasPrice" => read::gas_price(chain).await,
            "eth_getBalance" => read::balance(chain, &params).await,
            "eth_blockNumber" => read::block_number(chain).await,
            "eth_call" => read::call(chain, &params).await,
            "eth_getCode" => read::code(chain, &params).await,
            "eth_getStorageAt" => read::storage_at(chain, &params).await,
            "eth_getBlockByNumber" => read::block_by_number(chain, &params).await,
            "eth_getBlockByHash" => read::block_by_hash(chain, &params).await,
            "eth_getTransactionByHash" => read::transaction_by_hash(chain, &params).await,
            "eth_getTransactionCount" => read::transaction_count(chain, &params).await,
            "eth_estimateGas" => read::estimate_gas(chain, &params).await,
            "eth_getTransactionReceipt" => {
                read::transaction_receipt(chain, &self.settings, &params).await
            }

            // Writes
            "eth_sendTransaction" => transaction::send(self, page, &params).await,
            "personal_sign" => sign::personal_sign(self, page, &params).await,
            "eth_signTypedData" | "eth_signTypedData_v3" | "eth_signTypedData_v4" => {
                sign::typed_data(self, page, &params).await
            }
            "wallet_watchAsset" => asset::watch(self, page, request.params.as_ref()).await,

            _ => Err(DispatchError::MethodNotSupported(method.to_string())),
        }
    }

    /// Drop the wallet connection and tell every tab. Returns whether a
    /// signer was connected.
    pub async fn disconnect(&self) -> bool {
        let was_connected = self.session.disconnect().await;
        if was_connected {
            self.broadcast_accounts_changed().await;
        }
        was_connected
    }

    /// Open a gate and turn a rejection into an error.
    async fn confirm(&self, page: &PageContext, kind: GateKind, details: Value) -> Result<()> {
        match self.gates.open(page, kind, details).await {
            GateOutcome::Approved => Ok(()),
            GateOutcome::Rejected(reason) => Err(DispatchError::Rejected { kind, reason }),
        }
    }

    async fn signer(&self) -> Result<Arc<dyn Signer>> {
        self.session.signer().await.ok_or(DispatchError::NoAccount)
    }

    /// Signer whose address equals `requested`, compared as bytes.
    async fn signer_for(&self, requested: Address) -> Result<Arc<dyn Signer>> {
        let signer = self.signer().await?;
        let active = signer.address();
        if requested != active {
            return Err(DispatchError::AddressMismatch { requested, active });
        }
        Ok(signer)
    }

    async fn active_chain_hex(&self) -> String {
        self.upstream.registry.active_chain().await.hex_chain_id()
    }

    async fn selected_address(&self) -> Option<String> {
        self.session.account().await.map(|a| a.to_string())
    }

    /// Bring one tab's provider up to date after a connect.
    async fn announce_connection(&self, tab_id: &str, address: Address) {
        let chain_id = self.active_chain_hex().await;
        self.event_manager.emit_inject(HostMessage::state(
            tab_id,
            chain_id.clone(),
            Some(address.to_string()),
        ));
        self.event_manager.emit_inject(HostMessage::event(
            tab_id,
            "connect",
            json!({ "chainId": chain_id }),
        ));
        self.event_manager
            .emit_inject(HostMessage::event(tab_id, "accountsChanged", json!([address])));
    }

    /// Tell every open tab about the new chain.
    async fn broadcast_chain_changed(&self) {
        let chain_id = self.active_chain_hex().await;
        let selected = self.selected_address().await;
        for tab_id in self.tabs.ids().await {
            self.event_manager.emit_inject(HostMessage::state(
                tab_id.as_str(),
                chain_id.clone(),
                selected.clone(),
            ));
            self.event_manager
                .emit_inject(HostMessage::event(tab_id, "chainChanged", json!(chain_id)));
        }
    }

    /// Tell every open tab about the current accounts.
    async fn broadcast_accounts_changed(&self) {
        let chain_id = self.active_chain_hex().await;
        let selected = self.selected_address().await;
        let accounts: Vec<String> = selected.iter().cloned().collect();
        for tab_id in self.tabs.ids().await {
            self.event_manager.emit_inject(HostMessage::state(
                tab_id.as_str(),
                chain_id.clone(),
                selected.clone(),
            ));
            self.event_manager.emit_inject(HostMessage::event(
                tab_id,
                "accountsChanged",
                json!(accounts),
            ));
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| DispatchError::Internal(e.to_string()))
}

fn param<'a>(params: &'a [Value], index: usize, name: &str) -> Result<&'a Value> {
    params
        .get(index)
        .filter(|v| !v.is_null())
        .ok_or_else(|| DispatchError::InvalidParams(format!("Missing {}", name)))
}

fn parse_param<T: serde::de::DeserializeOwned>(
    params: &[Value],
    index: usize,
    name: &str,
) -> Result<T> {
    let value = param(params, index, name)?;
    serde_json::from_value(value.clone())
        .map_err(|e| DispatchError::InvalidParams(format!("Invalid {}: {}", name, e)))
}

/// Block tag or number at `index`, `"latest"` when absent.
fn block_param(params: &[Value], index: usize) -> Value {
    params
        .get(index)
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| json!("latest"))
}
