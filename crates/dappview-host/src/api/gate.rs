//! Confirmation modal buttons

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{parse_params, ApiError, Result};
use crate::gate::{GateError, GateKind, GateManager};

#[derive(Debug, Deserialize)]
struct GateParams {
    tab_id: String,
    kind: GateKind,
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        ApiError::NotFound(e.to_string())
    }
}

pub async fn list(manager: &Arc<GateManager>, _params: Option<Value>) -> Result<Value> {
    Ok(serde_json::to_value(manager.list().await)?)
}

pub async fn approve(manager: &Arc<GateManager>, params: Option<Value>) -> Result<Value> {
    let params: GateParams = parse_params(params)?;
    let gate = manager.approve(&params.tab_id, params.kind).await?;
    Ok(json!({ "status": "approved", "gate_id": gate.gate_id }))
}

pub async fn reject(manager: &Arc<GateManager>, params: Option<Value>) -> Result<Value> {
    let params: GateParams = parse_params(params)?;
    let gate = manager.reject(&params.tab_id, params.kind).await?;
    Ok(json!({ "status": "rejected", "gate_id": gate.gate_id }))
}
