//! Page traffic forwarded by the embedder

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{parse_params, ApiError, Result};
use crate::bridge::{Bridge, BridgeError};

#[derive(Debug, Deserialize)]
struct MessageParams {
    tab_id: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct TabIdParams {
    tab_id: String,
}

/// Hand a raw page message to the bridge; the answer arrives as `page.inject`
pub async fn message(bridge: &Arc<Bridge>, params: Option<Value>) -> Result<Value> {
    let params: MessageParams = parse_params(params)?;
    let disposition = bridge.handle_page_message(&params.tab_id, &params.data).await;
    Ok(json!({ "status": disposition }))
}

pub async fn provider_script(bridge: &Arc<Bridge>, params: Option<Value>) -> Result<Value> {
    let params: TabIdParams = parse_params(params)?;
    let script = bridge
        .provider_script(&params.tab_id)
        .await
        .map_err(|e| match e {
            BridgeError::TabNotFound(_) => ApiError::NotFound(e.to_string()),
            BridgeError::Script(e) => ApiError::Json(e),
        })?;
    Ok(json!({ "script": script }))
}
