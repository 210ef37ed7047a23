pub mod manager;

pub use manager::{TabManager, TabManagerError};

use dappview_core::models::Tab;

/// The page a request came from, captured when the bridge accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub tab_id: String,
    /// Navigation count of the tab at accept time
    pub page: u64,
    pub origin: String,
}

impl PageContext {
    pub fn of(tab: &Tab) -> Self {
        Self {
            tab_id: tab.id.clone(),
            page: tab.page,
            origin: tab.origin().to_string(),
        }
    }
}
