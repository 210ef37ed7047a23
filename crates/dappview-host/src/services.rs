//! Wiring of the managers that make up the host

use dappview_core::models::Config;
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::Bridge;
use crate::dispatch::{DispatchSettings, Dispatcher};
use crate::event_manager::EventManager;
use crate::gate::GateManager;
use crate::tab::TabManager;
use crate::upstream::Upstream;
use crate::wallet::{ChainRegistry, WalletSession};

#[derive(Clone)]
pub struct HostServices {
    pub event_manager: Arc<EventManager>,
    pub gates: Arc<GateManager>,
    pub tabs: Arc<TabManager>,
    pub session: Arc<WalletSession>,
    pub registry: Arc<dyn ChainRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub bridge: Arc<Bridge>,
}

impl HostServices {
    pub fn new(config: &Config, upstream: Upstream) -> Self {
        let event_manager = Arc::new(EventManager::new());
        let gates = Arc::new(GateManager::new(
            event_manager.clone(),
            config.gate.timeout_secs.map(Duration::from_secs),
        ));
        let tabs = Arc::new(TabManager::new(gates.clone(), event_manager.clone()));
        let session = Arc::new(WalletSession::new());
        let registry = upstream.registry.clone();

        let dispatcher = Arc::new(Dispatcher::new(
            upstream,
            session.clone(),
            gates.clone(),
            tabs.clone(),
            event_manager.clone(),
            DispatchSettings::from_config(config),
        ));
        let bridge = Arc::new(Bridge::new(
            dispatcher.clone(),
            tabs.clone(),
            session.clone(),
            registry.clone(),
            event_manager.clone(),
        ));

        Self {
            event_manager,
            gates,
            tabs,
            session,
            registry,
            dispatcher,
            bridge,
        }
    }
}
