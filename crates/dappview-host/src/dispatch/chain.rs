//! Chain identity, switching and registration

use dappview_core::models::chain::{parse_chain_id, to_hex_chain_id};
use dappview_core::models::{AddEthereumChainParameter, ChainDefinition};
use serde_json::{json, Value};

use super::{param, DispatchError, Dispatcher, Result};
use crate::gate::GateKind;
use crate::tab::PageContext;
use crate::wallet::ChainRegistry;

pub(super) async fn chain_id(registry: &dyn ChainRegistry) -> Value {
    json!(registry.active_chain().await.hex_chain_id())
}

pub(super) async fn net_version(registry: &dyn ChainRegistry) -> Value {
    json!(registry.active_chain().await.chain_id.to_string())
}

fn target_chain_id(params: &[Value]) -> Result<u64> {
    let target = param(params, 0, "chain parameter")?
        .get("chainId")
        .ok_or_else(|| DispatchError::InvalidParams("Missing chainId".to_string()))?;
    parse_chain_id(target).map_err(|e| DispatchError::InvalidParams(e.to_string()))
}

pub(super) async fn switch(
    ctx: &Dispatcher,
    page: &PageContext,
    params: &[Value],
) -> Result<Value> {
    let chain_id = target_chain_id(params)?;
    let registry = ctx.upstream.registry.as_ref();

    let active = registry.active_chain().await;
    if active.chain_id == chain_id {
        return Ok(Value::Null);
    }

    let target = registry.get(chain_id).await.ok_or_else(|| {
        DispatchError::UnrecognizedChain(format!(
            "Unrecognized chain ID {}. Try adding the chain using wallet_addEthereumChain first.",
            to_hex_chain_id(chain_id)
        ))
    })?;

    let details = json!({
        "origin": page.origin,
        "from": active,
        "to": target,
    });
    ctx.confirm(page, GateKind::SwitchChain, details).await?;

    registry
        .switch_active_chain(chain_id)
        .await
        .map_err(|e| DispatchError::UnrecognizedChain(e.to_string()))?;

    ctx.broadcast_chain_changed().await;
    Ok(Value::Null)
}

pub(super) async fn add(ctx: &Dispatcher, page: &PageContext, params: &[Value]) -> Result<Value> {
    let chain_id = target_chain_id(params)?;
    let registry = ctx.upstream.registry.as_ref();

    let active = registry.active_chain().await;
    if active.chain_id == chain_id {
        return Ok(Value::Null);
    }

    let parameter: AddEthereumChainParameter = serde_json::from_value(params[0].clone())
        .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;
    let definition = ChainDefinition::try_from(parameter)
        .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;

    let details = json!({
        "origin": page.origin,
        "chain": definition,
    });
    ctx.confirm(page, GateKind::AddChain, details).await?;

    registry
        .define_chains(vec![definition])
        .await
        .map_err(|e| DispatchError::UnrecognizedChain(e.to_string()))?;
    registry
        .switch_active_chain(chain_id)
        .await
        .map_err(|e| DispatchError::UnrecognizedChain(e.to_string()))?;

    ctx.broadcast_chain_changed().await;
    Ok(Value::Null)
}
