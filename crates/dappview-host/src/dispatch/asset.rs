//! `wallet_watchAsset`

use dappview_core::models::WatchAssetRequest;
use serde_json::{json, Value};

use super::{DispatchError, Dispatcher, Result};
use crate::gate::{GateKind, GateOutcome};
use crate::tab::PageContext;

/// The watch request is sent either bare or as a one-element array.
fn payload(params: Option<&Value>) -> Option<&Value> {
    match params {
        Some(Value::Array(items)) => items.first(),
        Some(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

pub(super) async fn watch(
    ctx: &Dispatcher,
    page: &PageContext,
    params: Option<&Value>,
) -> Result<Value> {
    let raw = payload(params)
        .ok_or_else(|| DispatchError::InvalidParams("Missing asset parameters".to_string()))?;
    let request =
        WatchAssetRequest::from_value(raw).map_err(|e| DispatchError::InvalidParams(e.to_string()))?;

    let details = json!({
        "origin": page.origin,
        "asset": request,
    });

    // Rejection is an answer here, not an error.
    match ctx.gates.open(page, GateKind::WatchAsset, details).await {
        GateOutcome::Approved => {
            if !ctx.session.watch_asset(request.options).await {
                tracing::debug!("Asset already watched");
            }
            Ok(json!(true))
        }
        GateOutcome::Rejected(reason) => {
            tracing::debug!("Watch asset rejected: {}", reason);
            Ok(json!(false))
        }
    }
}
