//! Entry point for traffic from embedded pages

use dappview_core::models::{HostMessage, PageFrame, Request, Response, RpcError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::event_manager::EventManager;
use crate::shim;
use crate::tab::{PageContext, TabManager};
use crate::transport::{self, FrameError};
use crate::wallet::{ChainRegistry, WalletSession};

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Failed to render provider script: {0}")]
    Script(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// What happened to a page message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Accepted,
    Discarded,
}

pub struct Bridge {
    dispatcher: Arc<Dispatcher>,
    tabs: Arc<TabManager>,
    session: Arc<WalletSession>,
    registry: Arc<dyn ChainRegistry>,
    event_manager: Arc<EventManager>,
}

impl Bridge {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        tabs: Arc<TabManager>,
        session: Arc<WalletSession>,
        registry: Arc<dyn ChainRegistry>,
        event_manager: Arc<EventManager>,
    ) -> Self {
        Self {
            dispatcher,
            tabs,
            session,
            registry,
            event_manager,
        }
    }

    /// Accept a raw string a page posted. Requests are answered asynchronously
    /// through a `page.inject` event for the same tab, as long as the page
    /// that sent them is still loaded.
    pub async fn handle_page_message(&self, tab_id: &str, raw: &str) -> Disposition {
        let Some(page) = self.tabs.page(tab_id).await else {
            tracing::warn!("Discarding message for unknown tab {}", tab_id);
            return Disposition::Discarded;
        };

        match transport::parse_page_frame(raw) {
            Ok(PageFrame::Request(request)) => {
                self.spawn_dispatch(page, request);
                Disposition::Accepted
            }
            Ok(PageFrame::Debug(frame)) => {
                tracing::debug!(
                    "[tab {}] page {}: {}",
                    tab_id,
                    frame.direction,
                    frame.payload
                );
                Disposition::Accepted
            }
            Err(FrameError::InvalidRequest { id, error }) => {
                tracing::warn!("Invalid request from tab {}: {}", tab_id, error.message);
                self.event_manager
                    .emit_inject(HostMessage::response(tab_id, Response::error(error, id)));
                Disposition::Accepted
            }
            Err(e) => {
                tracing::warn!("Discarding frame from tab {}: {}", tab_id, e);
                Disposition::Discarded
            }
        }
    }

    /// Each request runs on its own task so a suspended gate or a receipt poll
    /// never holds up other requests.
    fn spawn_dispatch(&self, page: PageContext, request: Request) {
        let dispatcher = self.dispatcher.clone();
        let tabs = self.tabs.clone();
        let event_manager = self.event_manager.clone();

        tokio::spawn(async move {
            let id = request.id.clone();
            let method = request.method.clone();

            let handler = {
                let page = page.clone();
                tokio::spawn(async move { dispatcher.dispatch(&page, &request).await })
            };

            let response = match handler.await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Handler for {} panicked: {}", method, e);
                    Response::error(RpcError::internal_error("Internal error"), id)
                }
            };

            if tabs.page(&page.tab_id).await.as_ref() != Some(&page) {
                tracing::debug!(
                    "Page {} of tab {} went away before {} completed",
                    page.page,
                    page.tab_id,
                    method
                );
                return;
            }
            event_manager.emit_inject(HostMessage::response(page.tab_id, response));
        });
    }

    /// Provider script for a tab, reflecting the current chain and account.
    pub async fn provider_script(&self, tab_id: &str) -> Result<String> {
        if !self.tabs.contains(tab_id).await {
            return Err(BridgeError::TabNotFound(tab_id.to_string()));
        }

        let chain_id = self.registry.active_chain().await.hex_chain_id();
        let account = self.session.account().await.map(|a| a.to_string());
        Ok(shim::provider_script(tab_id, &chain_id, account.as_deref())?)
    }
}
