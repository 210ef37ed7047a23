//! API handlers for the embedder

pub mod config;
pub mod gate;
pub mod page;
pub mod tab;
pub mod wallet;

use dappview_core::models::RpcError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::ConfigManager;
use crate::events::BridgeEvent;
use crate::services::HostServices;

/// API error
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            ApiError::MethodNotFound(method) => RpcError::method_not_found(method),
            ApiError::InvalidParams(message) => RpcError::invalid_params(message.clone()),
            _ => RpcError::application_error(-32000, self.to_string()),
        }
    }
}

/// Deserialize the params object of an API call
fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.ok_or_else(|| ApiError::InvalidParams("Missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| ApiError::InvalidParams(e.to_string()))
}

/// Main API handler that routes requests to appropriate handlers
pub struct ApiHandler {
    services: HostServices,
    config_manager: Arc<ConfigManager>,
}

impl ApiHandler {
    pub fn new(services: HostServices, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            services,
            config_manager,
        }
    }

    pub async fn handle(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let s = &self.services;
        match method {
            // Tab methods
            "tab.open" => tab::open(&s.tabs, params).await,
            "tab.close" => tab::close(&s.tabs, params).await,
            "tab.navigate" => tab::navigate(&s.tabs, params).await,
            "tab.update" => tab::update(&s.tabs, params).await,
            "tab.activate" => tab::activate(&s.tabs, params).await,
            "tab.list" => tab::list(&s.tabs, params).await,

            // Page traffic
            "page.message" => page::message(&s.bridge, params).await,
            "page.provider_script" => page::provider_script(&s.bridge, params).await,

            // Confirmation gates
            "gate.list" => gate::list(&s.gates, params).await,
            "gate.approve" => gate::approve(&s.gates, params).await,
            "gate.reject" => gate::reject(&s.gates, params).await,

            // Wallet session
            "wallet.status" => wallet::status(&s.session, s.registry.as_ref(), params).await,
            "wallet.assets" => wallet::assets(&s.session, params).await,
            "wallet.disconnect" => wallet::disconnect(&s.dispatcher, params).await,

            // Config
            "config.get" => config::get(&self.config_manager, params).await,

            // Unknown method
            _ => Err(ApiError::MethodNotFound(method.to_string())),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.services.event_manager.subscribe()
    }
}
