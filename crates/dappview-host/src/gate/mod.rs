//! Confirmation gates: suspend a request until the user answers a modal

pub mod manager;

pub use manager::{GateError, GateManager};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of confirmation modal. Each (tab, kind) pair is an independent slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    Connect,
    SendTransaction,
    SwitchChain,
    AddChain,
    SignMessage,
    SignTypedData,
    WatchAsset,
}

impl GateKind {
    /// What the user is asked to approve, as used in rejection messages.
    pub fn action(&self) -> &'static str {
        match self {
            GateKind::Connect => "connection request",
            GateKind::SendTransaction => "transaction",
            GateKind::SwitchChain => "chain switch",
            GateKind::AddChain => "chain addition",
            GateKind::SignMessage => "message signature",
            GateKind::SignTypedData => "typed data signature",
            GateKind::WatchAsset => "asset registration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Reject button or modal dismissal
    User,
    /// Another confirmation of the same kind was opened for the tab
    Superseded,
    /// The tab was closed or navigated away
    TabClosed,
    Timeout,
    /// The gate was dropped without an answer
    Abandoned,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RejectReason::User => "user rejected",
            RejectReason::Superseded => "superseded by a newer request",
            RejectReason::TabClosed => "tab closed",
            RejectReason::Timeout => "timed out",
            RejectReason::Abandoned => "abandoned",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Approved,
    Rejected(RejectReason),
}

/// Modal state visible to the embedder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingConfirmation {
    pub gate_id: String,
    pub tab_id: String,
    pub kind: GateKind,
    pub details: Value,
    pub opened_at: DateTime<Utc>,
}
