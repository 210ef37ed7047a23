//! IPC module for embedder communication

pub mod server;

pub use dappview_core::models::{Notification, Request, RequestId, Response, RpcError};
pub use server::IpcServer;
