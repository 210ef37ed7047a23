//! Wallet session API methods

use serde_json::{json, Value};
use std::sync::Arc;

use super::Result;
use crate::dispatch::Dispatcher;
use crate::wallet::{ChainRegistry, WalletSession};

pub async fn status(
    session: &Arc<WalletSession>,
    registry: &dyn ChainRegistry,
    _params: Option<Value>,
) -> Result<Value> {
    let address = session.account().await;
    let chain = registry.active_chain().await;
    Ok(json!({
        "connected": address.is_some(),
        "address": address,
        "chain_id": chain.chain_id,
        "chain_name": chain.chain_name,
    }))
}

pub async fn assets(session: &Arc<WalletSession>, _params: Option<Value>) -> Result<Value> {
    Ok(serde_json::to_value(session.watched_assets().await)?)
}

pub async fn disconnect(dispatcher: &Arc<Dispatcher>, _params: Option<Value>) -> Result<Value> {
    let status = if dispatcher.disconnect().await {
        "disconnected"
    } else {
        "not_connected"
    };
    Ok(json!({ "status": status }))
}
