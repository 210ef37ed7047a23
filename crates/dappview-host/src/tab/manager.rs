use std::sync::Arc;
use tokio::sync::RwLock;

use super::PageContext;
use crate::event_manager::EventManager;
use crate::events::TabEvent;
use crate::gate::GateManager;
use dappview_core::models::Tab;

#[derive(Debug, thiserror::Error)]
pub enum TabManagerError {
    #[error("Tab not found: {0}")]
    NotFound(String),

    #[error("Invalid tab: {0}")]
    Invalid(#[from] dappview_core::Error),
}

pub type Result<T> = std::result::Result<T, TabManagerError>;

#[derive(Default)]
struct TabState {
    /// Open tabs in creation order
    tabs: Vec<Tab>,
    active: Option<String>,
}

/// Gate pages are updated while `state` is held, so the gate manager
/// always sees tab lifecycle changes in order.
pub struct TabManager {
    state: Arc<RwLock<TabState>>,
    gates: Arc<GateManager>,
    event_manager: Arc<EventManager>,
}

impl TabManager {
    pub fn new(gates: Arc<GateManager>, event_manager: Arc<EventManager>) -> Self {
        Self {
            state: Arc::new(RwLock::new(TabState::default())),
            gates,
            event_manager,
        }
    }

    /// Open a tab and make it the active one
    pub async fn open(&self, url: &str) -> Result<Tab> {
        let tab = Tab::new(url)?;

        {
            let mut state = self.state.write().await;
            self.gates.attach_page(&tab.id, tab.page).await;
            state.tabs.push(tab.clone());
            state.active = Some(tab.id.clone());
        }

        tracing::info!("Opened tab {} at {}", tab.id, tab.url);
        self.event_manager.emit_tab(TabEvent::opened(tab.clone()));
        Ok(tab)
    }

    /// Close a tab, rejecting whatever it is still waiting on
    pub async fn close(&self, tab_id: &str) -> Result<usize> {
        let rejected = {
            let mut state = self.state.write().await;
            let index = state
                .tabs
                .iter()
                .position(|t| t.id == tab_id)
                .ok_or_else(|| TabManagerError::NotFound(tab_id.to_string()))?;
            state.tabs.remove(index);

            if state.active.as_deref() == Some(tab_id) {
                let next = index.min(state.tabs.len().saturating_sub(1));
                state.active = state.tabs.get(next).map(|t| t.id.clone());
            }

            self.gates.detach_page(tab_id).await
        };

        tracing::info!("Closed tab {}", tab_id);
        self.event_manager.emit_tab(TabEvent::closed(tab_id.to_string()));
        Ok(rejected)
    }

    /// Load a new page in a tab. The previous page's confirmations are void.
    pub async fn navigate(&self, tab_id: &str, url: &str) -> Result<Tab> {
        let tab = {
            let mut state = self.state.write().await;
            let tab = find_mut(&mut state.tabs, tab_id)?;
            tab.navigate(url)?;
            let tab = tab.clone();
            self.gates.attach_page(&tab.id, tab.page).await;
            tab
        };

        tracing::info!("Tab {} navigated to {}", tab.id, tab.url);
        self.event_manager.emit_tab(TabEvent::navigated(tab.clone()));
        Ok(tab)
    }

    /// Record title/favicon reported by the page
    pub async fn update(
        &self,
        tab_id: &str,
        title: Option<String>,
        favicon: Option<String>,
    ) -> Result<Tab> {
        let tab = {
            let mut state = self.state.write().await;
            let tab = find_mut(&mut state.tabs, tab_id)?;
            tab.set_metadata(title, favicon);
            tab.validate()?;
            tab.clone()
        };

        self.event_manager.emit_tab(TabEvent::updated(tab.clone()));
        Ok(tab)
    }

    pub async fn activate(&self, tab_id: &str) -> Result<Tab> {
        let tab = {
            let mut state = self.state.write().await;
            let tab = state
                .tabs
                .iter()
                .find(|t| t.id == tab_id)
                .cloned()
                .ok_or_else(|| TabManagerError::NotFound(tab_id.to_string()))?;
            state.active = Some(tab.id.clone());
            tab
        };

        self.event_manager.emit_tab(TabEvent::activated(tab.clone()));
        Ok(tab)
    }

    pub async fn get(&self, tab_id: &str) -> Result<Tab> {
        let state = self.state.read().await;
        state
            .tabs
            .iter()
            .find(|t| t.id == tab_id)
            .cloned()
            .ok_or_else(|| TabManagerError::NotFound(tab_id.to_string()))
    }

    /// Page currently loaded in a tab
    pub async fn page(&self, tab_id: &str) -> Option<PageContext> {
        let state = self.state.read().await;
        state.tabs.iter().find(|t| t.id == tab_id).map(PageContext::of)
    }

    pub async fn contains(&self, tab_id: &str) -> bool {
        let state = self.state.read().await;
        state.tabs.iter().any(|t| t.id == tab_id)
    }

    pub async fn list(&self) -> Vec<Tab> {
        self.state.read().await.tabs.clone()
    }

    pub async fn ids(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.tabs.iter().map(|t| t.id.clone()).collect()
    }

    pub async fn active_tab_id(&self) -> Option<String> {
        self.state.read().await.active.clone()
    }
}

fn find_mut<'a>(tabs: &'a mut [Tab], tab_id: &str) -> Result<&'a mut Tab> {
    tabs.iter_mut()
        .find(|t| t.id == tab_id)
        .ok_or_else(|| TabManagerError::NotFound(tab_id.to_string()))
}
