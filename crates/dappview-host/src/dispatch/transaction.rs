//! `eth_sendTransaction`

use alloy_primitives::{U256, U64};
use dappview_core::models::TransactionRequest;
use serde_json::{json, Value};

use super::{parse_param, Dispatcher, Result};
use crate::gate::GateKind;
use crate::tab::PageContext;

/// Gas limit used when the signer cannot estimate, keyed by function selector.
pub fn heuristic_gas_limit(tx: &TransactionRequest) -> u64 {
    if !tx.has_calldata() {
        return 21_000;
    }

    match tx.selector() {
        // transfer(address,uint256)
        Some([0xa9, 0x05, 0x9c, 0xbb]) => 65_000,
        // approve(address,uint256)
        Some([0x09, 0x5e, 0xa7, 0xb3]) => 60_000,
        // transferFrom(address,address,uint256)
        Some([0x23, 0xb8, 0x72, 0xdd]) => 80_000,
        // safeTransferFrom, ERC-721 and ERC-1155 overloads
        Some([0x42, 0x84, 0x2e, 0x0e])
        | Some([0xb8, 0x8d, 0x4f, 0xde])
        | Some([0xf2, 0x42, 0x43, 0x2a]) => 120_000,
        // setApprovalForAll(address,bool)
        Some([0xa2, 0x2c, 0xb4, 0x65]) => 60_000,
        // swapExactTokensForTokens, swapExactETHForTokens
        Some([0x38, 0xed, 0x17, 0x39]) | Some([0x7f, 0xf3, 0x6a, 0xb5]) => 250_000,
        // multicall
        Some([0xac, 0x96, 0x50, 0xd8]) | Some([0x5a, 0xe4, 0x01, 0xdc]) => 350_000,
        _ => 300_000,
    }
}

pub(super) async fn send(ctx: &Dispatcher, page: &PageContext, params: &[Value]) -> Result<Value> {
    let mut tx: TransactionRequest = parse_param(params, 0, "transaction")?;

    let signer = match tx.from {
        Some(from) => ctx.signer_for(from).await?,
        None => {
            let signer = ctx.signer().await?;
            tx.from = Some(signer.address());
            signer
        }
    };
    let account = signer.address();
    let chain = ctx.upstream.chain.as_ref();

    if tx.gas_price.is_none() && !tx.uses_dynamic_fees() {
        tx.gas_price = Some(chain.gas_price().await?);
    }

    if tx.nonce.is_none() {
        let nonce = chain
            .get_transaction_count(account, &json!("pending"))
            .await?;
        tx.nonce = Some(U64::from(nonce));
    }

    let active = ctx.upstream.registry.active_chain().await;
    if tx.chain_id.is_none() {
        tx.chain_id = Some(U64::from(active.chain_id));
    }

    if tx.gas.is_none() {
        let gas = match signer.estimate_gas(&tx).await {
            Ok(gas) => gas,
            Err(e) => {
                let fallback = heuristic_gas_limit(&tx);
                tracing::warn!("Gas estimation failed ({}), using {}", e, fallback);
                U256::from(fallback)
            }
        };
        tx.gas = Some(gas);
    }

    let decoded = match tx.data.as_ref().filter(|d| !d.is_empty()) {
        Some(data) => match ctx.upstream.decoder.decode(data).await {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!("Calldata not decoded: {}", e);
                None
            }
        },
        None => None,
    };

    let details = json!({
        "origin": page.origin,
        "chainId": active.hex_chain_id(),
        "transaction": tx,
        "decoded": decoded,
    });
    ctx.confirm(page, GateKind::SendTransaction, details).await?;

    let hash = signer.send_transaction(&tx).await?;
    tracing::info!("Submitted transaction {} from tab {}", hash, page.tab_id);
    Ok(json!(hash))
}
