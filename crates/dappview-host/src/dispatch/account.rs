//! Connection and permission methods

use serde_json::{json, Value};

use super::{Dispatcher, Result};
use crate::gate::GateKind;
use crate::tab::PageContext;
use crate::wallet::WalletSession;

/// `eth_accounts` permission as dApps expect to find it.
pub(super) async fn permissions(session: &WalletSession) -> Value {
    match session.account().await {
        Some(address) => json!([{
            "parentCapability": "eth_accounts",
            "caveats": [{
                "type": "restrictReturnedAccounts",
                "value": [address],
            }],
        }]),
        None => json!([]),
    }
}

pub(super) async fn accounts(session: &WalletSession) -> Value {
    match session.account().await {
        Some(address) => json!([address]),
        None => json!([]),
    }
}

pub(super) async fn revoke(ctx: &Dispatcher) -> Result<Value> {
    ctx.disconnect().await;
    Ok(Value::Null)
}

pub(super) async fn request_accounts(ctx: &Dispatcher, page: &PageContext) -> Result<Value> {
    if let Some(address) = ctx.session.account().await {
        ctx.announce_connection(&page.tab_id, address).await;
        return Ok(json!([address]));
    }

    let chain = ctx.upstream.registry.active_chain().await;
    let details = json!({
        "origin": page.origin,
        "chainId": chain.hex_chain_id(),
        "chainName": chain.chain_name,
    });
    ctx.confirm(page, GateKind::Connect, details).await?;

    let signer = ctx.upstream.connector.connect(&chain).await?;
    let address = signer.address();
    ctx.session.connect(signer).await;

    for tab in ctx.tabs.ids().await {
        ctx.announce_connection(&tab, address).await;
    }
    Ok(json!([address]))
}
