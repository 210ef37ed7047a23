//! DappView host library
//!
//! The Web3 bridge behind every browser tab, exposed as a library for the
//! daemon binary and for testing.

pub mod api;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod event_manager;
pub mod events;
pub mod gate;
pub mod ipc;
pub mod services;
pub mod shim;
pub mod tab;
pub mod transport;
pub mod upstream;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use api::ApiHandler;
pub use bridge::{Bridge, Disposition};
pub use config::ConfigManager;
pub use dispatch::Dispatcher;
pub use event_manager::EventManager;
pub use events::BridgeEvent;
pub use gate::{GateKind, GateManager};
pub use ipc::{IpcServer, Notification, Request, Response};
pub use services::HostServices;
pub use tab::TabManager;
pub use upstream::Upstream;
pub use wallet::WalletSession;
