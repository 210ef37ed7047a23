use serde_json::Value;
use std::sync::Arc;

use super::Result;
use crate::config::ConfigManager;

pub async fn get(manager: &Arc<ConfigManager>, _params: Option<Value>) -> Result<Value> {
    let config = manager.get().await;
    Ok(serde_json::to_value(&config)?)
}
