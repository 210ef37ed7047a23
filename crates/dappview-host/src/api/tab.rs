//! Tab API methods

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{parse_params, ApiError, Result};
use crate::tab::{TabManager, TabManagerError};

#[derive(Debug, Deserialize)]
struct OpenParams {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TabIdParams {
    tab_id: String,
}

#[derive(Debug, Deserialize)]
struct NavigateParams {
    tab_id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    tab_id: String,
    title: Option<String>,
    favicon: Option<String>,
}

impl From<TabManagerError> for ApiError {
    fn from(e: TabManagerError) -> Self {
        match e {
            TabManagerError::NotFound(_) => ApiError::NotFound(e.to_string()),
            TabManagerError::Invalid(_) => ApiError::InvalidParams(e.to_string()),
        }
    }
}

/// Open a tab
pub async fn open(manager: &Arc<TabManager>, params: Option<Value>) -> Result<Value> {
    let params: OpenParams = parse_params(params)?;
    let tab = manager.open(&params.url).await?;
    Ok(serde_json::to_value(&tab)?)
}

/// Close a tab and reject what it was waiting on
pub async fn close(manager: &Arc<TabManager>, params: Option<Value>) -> Result<Value> {
    let params: TabIdParams = parse_params(params)?;
    let rejected = manager.close(&params.tab_id).await?;
    Ok(json!({ "status": "closed", "rejected_gates": rejected }))
}

pub async fn navigate(manager: &Arc<TabManager>, params: Option<Value>) -> Result<Value> {
    let params: NavigateParams = parse_params(params)?;
    let tab = manager.navigate(&params.tab_id, &params.url).await?;
    Ok(serde_json::to_value(&tab)?)
}

pub async fn update(manager: &Arc<TabManager>, params: Option<Value>) -> Result<Value> {
    let params: UpdateParams = parse_params(params)?;
    let tab = manager
        .update(&params.tab_id, params.title, params.favicon)
        .await?;
    Ok(serde_json::to_value(&tab)?)
}

pub async fn activate(manager: &Arc<TabManager>, params: Option<Value>) -> Result<Value> {
    let params: TabIdParams = parse_params(params)?;
    let tab = manager.activate(&params.tab_id).await?;
    Ok(serde_json::to_value(&tab)?)
}

pub async fn list(manager: &Arc<TabManager>, _params: Option<Value>) -> Result<Value> {
    let tabs = manager.list().await;
    let active = manager.active_tab_id().await;
    Ok(json!({ "tabs": tabs, "active_tab_id": active }))
}
