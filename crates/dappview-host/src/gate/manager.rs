//! Gate manager - pending confirmations keyed by (tab, kind)

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use uuid::Uuid;

use super::{GateKind, GateOutcome, PendingConfirmation, RejectReason};
use crate::event_manager::EventManager;
use crate::events::GateEvent;
use crate::tab::PageContext;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("No pending {kind:?} confirmation for tab {tab_id}")]
    NotFound { tab_id: String, kind: GateKind },
}

pub type Result<T> = std::result::Result<T, GateError>;

type GateKey = (String, GateKind);

struct PendingGate {
    info: PendingConfirmation,
    page: u64,
    responder: oneshot::Sender<GateOutcome>,
}

#[derive(Default)]
struct GateState {
    pending: HashMap<GateKey, PendingGate>,
    /// Live page of every open tab
    pages: HashMap<String, u64>,
}

impl GateState {
    /// Remove and return every gate `drop_it` selects.
    fn take_where(&mut self, drop_it: impl Fn(&str, &PendingGate) -> bool) -> Vec<PendingGate> {
        let keys: Vec<GateKey> = self
            .pending
            .iter()
            .filter(|((tab, _), gate)| drop_it(tab, gate))
            .map(|(key, _)| key.clone())
            .collect();
        keys.iter().filter_map(|key| self.pending.remove(key)).collect()
    }
}

/// Holds the suspended side of every open confirmation modal.
pub struct GateManager {
    state: Arc<RwLock<GateState>>,
    event_manager: Arc<EventManager>,
    timeout: Option<Duration>,
}

impl GateManager {
    pub fn new(event_manager: Arc<EventManager>, timeout: Option<Duration>) -> Self {
        Self {
            state: Arc::new(RwLock::new(GateState::default())),
            event_manager,
            timeout,
        }
    }

    /// Open a confirmation for `page` and wait for its outcome.
    ///
    /// A still-pending confirmation of the same kind for the same tab is
    /// rejected as superseded. Other tabs and other kinds are untouched.
    /// A page that is no longer loaded gets `TabClosed` without a modal.
    pub async fn open(&self, page: &PageContext, kind: GateKind, details: Value) -> GateOutcome {
        let tab_id = page.tab_id.as_str();
        let (responder, mut receiver) = oneshot::channel();
        let info = PendingConfirmation {
            gate_id: Uuid::new_v4().to_string(),
            tab_id: tab_id.to_string(),
            kind,
            details,
            opened_at: Utc::now(),
        };
        let gate_id = info.gate_id.clone();
        let opened = GateEvent::opened(&info);

        let previous = {
            let mut state = self.state.write().await;
            match state.pages.get_mut(tab_id) {
                Some(live) if page.page >= *live => *live = page.page,
                _ => {
                    tracing::debug!(
                        "Not opening {:?} confirmation for tab {}: page {} is gone",
                        kind,
                        tab_id,
                        page.page
                    );
                    return GateOutcome::Rejected(RejectReason::TabClosed);
                }
            }
            let gate = PendingGate {
                info,
                page: page.page,
                responder,
            };
            state.pending.insert((tab_id.to_string(), kind), gate)
        };

        if let Some(previous) = previous {
            tracing::warn!(
                "Superseding pending {:?} confirmation {} for tab {}",
                kind,
                previous.info.gate_id,
                tab_id
            );
            self.settle(previous, GateOutcome::Rejected(RejectReason::Superseded));
        }

        self.event_manager.emit_gate(opened);

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut receiver).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    if self.expire(tab_id, kind, &gate_id).await {
                        return GateOutcome::Rejected(RejectReason::Timeout);
                    }
                    // Settled between the deadline and the removal.
                    receiver.await
                }
            },
            None => receiver.await,
        };

        outcome.unwrap_or(GateOutcome::Rejected(RejectReason::Abandoned))
    }

    /// Approve button.
    pub async fn approve(&self, tab_id: &str, kind: GateKind) -> Result<PendingConfirmation> {
        self.answer(tab_id, kind, GateOutcome::Approved).await
    }

    /// Reject button or modal dismissal.
    pub async fn reject(&self, tab_id: &str, kind: GateKind) -> Result<PendingConfirmation> {
        self.answer(tab_id, kind, GateOutcome::Rejected(RejectReason::User))
            .await
    }

    /// Record that `tab_id` now shows `page`. Confirmations opened by
    /// earlier pages are rejected as `TabClosed`.
    pub async fn attach_page(&self, tab_id: &str, page: u64) -> usize {
        let removed = {
            let mut state = self.state.write().await;
            let live = state.pages.entry(tab_id.to_string()).or_insert(page);
            *live = (*live).max(page);
            let live = *live;
            state.take_where(|tab, gate| tab == tab_id && gate.page < live)
        };
        self.reject_all(tab_id, removed)
    }

    /// Forget a closed tab and reject everything it is still waiting on.
    pub async fn detach_page(&self, tab_id: &str) -> usize {
        let removed = {
            let mut state = self.state.write().await;
            state.pages.remove(tab_id);
            state.take_where(|tab, _| tab == tab_id)
        };
        self.reject_all(tab_id, removed)
    }

    pub async fn list(&self) -> Vec<PendingConfirmation> {
        let state = self.state.read().await;
        let mut items: Vec<PendingConfirmation> =
            state.pending.values().map(|gate| gate.info.clone()).collect();
        items.sort_by_key(|info| info.opened_at);
        items
    }

    pub async fn get(&self, tab_id: &str, kind: GateKind) -> Option<PendingConfirmation> {
        let state = self.state.read().await;
        state
            .pending
            .get(&(tab_id.to_string(), kind))
            .map(|gate| gate.info.clone())
    }

    async fn answer(
        &self,
        tab_id: &str,
        kind: GateKind,
        outcome: GateOutcome,
    ) -> Result<PendingConfirmation> {
        let gate = {
            let mut state = self.state.write().await;
            state.pending.remove(&(tab_id.to_string(), kind))
        }
        .ok_or_else(|| GateError::NotFound {
            tab_id: tab_id.to_string(),
            kind,
        })?;

        let info = gate.info.clone();
        self.settle(gate, outcome);
        Ok(info)
    }

    /// Remove a timed-out gate if it is still the one we opened.
    async fn expire(&self, tab_id: &str, kind: GateKind, gate_id: &str) -> bool {
        let gate = {
            let mut state = self.state.write().await;
            let key = (tab_id.to_string(), kind);
            match state.pending.get(&key) {
                Some(gate) if gate.info.gate_id == gate_id => state.pending.remove(&key),
                _ => None,
            }
        };

        match gate {
            Some(gate) => {
                tracing::warn!("{:?} confirmation for tab {} timed out", kind, tab_id);
                self.emit_closed(&gate.info, GateOutcome::Rejected(RejectReason::Timeout));
                true
            }
            None => false,
        }
    }

    fn reject_all(&self, tab_id: &str, gates: Vec<PendingGate>) -> usize {
        let count = gates.len();
        for gate in gates {
            self.settle(gate, GateOutcome::Rejected(RejectReason::TabClosed));
        }
        if count > 0 {
            tracing::info!("Rejected {} pending confirmation(s) for tab {}", count, tab_id);
        }
        count
    }

    /// Close the modal: one `closed` event per gate, then wake the waiter.
    fn settle(&self, gate: PendingGate, outcome: GateOutcome) {
        self.emit_closed(&gate.info, outcome);
        let _ = gate.responder.send(outcome);
    }

    fn emit_closed(&self, info: &PendingConfirmation, outcome: GateOutcome) {
        let reason = match outcome {
            GateOutcome::Approved => None,
            GateOutcome::Rejected(reason) => Some(reason),
        };
        self.event_manager.emit_gate(GateEvent::closed(info, reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BridgeEvent, GateEventType};
    use serde_json::json;
    use tokio::sync::broadcast;

    fn manager(timeout: Option<Duration>) -> (Arc<GateManager>, broadcast::Receiver<BridgeEvent>) {
        let events = Arc::new(EventManager::new());
        let rx = events.subscribe();
        (Arc::new(GateManager::new(events, timeout)), rx)
    }

    fn page(tab_id: &str, page: u64) -> PageContext {
        PageContext {
            tab_id: tab_id.to_string(),
            page,
            origin: "https://app.uniswap.org".to_string(),
        }
    }

    /// Register `tab_id` at page 0 and spawn an `open` for it.
    async fn spawn_open(
        gates: &Arc<GateManager>,
        tab_id: &str,
        kind: GateKind,
        details: Value,
    ) -> tokio::task::JoinHandle<GateOutcome> {
        gates.attach_page(tab_id, 0).await;
        let gates = gates.clone();
        let page = page(tab_id, 0);
        tokio::spawn(async move { gates.open(&page, kind, details).await })
    }

    async fn next_gate_event(rx: &mut broadcast::Receiver<BridgeEvent>) -> crate::events::GateEvent {
        loop {
            if let BridgeEvent::Gate(event) = rx.recv().await.unwrap() {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn test_approve_resolves_waiter() {
        let (gates, mut rx) = manager(None);

        let waiter = spawn_open(&gates, "tab-1", GateKind::SignMessage, json!({})).await;

        let opened = next_gate_event(&mut rx).await;
        assert!(matches!(opened.event_type, GateEventType::Opened { .. }));
        assert_eq!(gates.list().await.len(), 1);

        gates.approve("tab-1", GateKind::SignMessage).await.unwrap();
        assert_eq!(waiter.await.unwrap(), GateOutcome::Approved);

        let closed = next_gate_event(&mut rx).await;
        assert!(matches!(
            closed.event_type,
            GateEventType::Closed { approved: true, .. }
        ));
        assert!(gates.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_reject_closes_exactly_once() {
        let (gates, mut rx) = manager(None);

        let waiter = spawn_open(&gates, "tab-1", GateKind::Connect, json!({})).await;
        next_gate_event(&mut rx).await;

        gates.reject("tab-1", GateKind::Connect).await.unwrap();
        assert!(gates.reject("tab-1", GateKind::Connect).await.is_err());
        assert_eq!(
            waiter.await.unwrap(),
            GateOutcome::Rejected(RejectReason::User)
        );

        let closed = next_gate_event(&mut rx).await;
        assert!(matches!(
            closed.event_type,
            GateEventType::Closed { approved: false, .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_same_kind_supersedes_previous() {
        let (gates, mut rx) = manager(None);

        let first = spawn_open(&gates, "tab-1", GateKind::SwitchChain, json!(1)).await;
        next_gate_event(&mut rx).await;

        let second = spawn_open(&gates, "tab-1", GateKind::SwitchChain, json!(2)).await;

        assert_eq!(
            first.await.unwrap(),
            GateOutcome::Rejected(RejectReason::Superseded)
        );

        loop {
            if let Some(pending) = gates.get("tab-1", GateKind::SwitchChain).await {
                if pending.details == json!(2) {
                    break;
                }
            }
            tokio::task::yield_now().await;
        }
        gates.approve("tab-1", GateKind::SwitchChain).await.unwrap();
        assert_eq!(second.await.unwrap(), GateOutcome::Approved);
    }

    #[tokio::test]
    async fn test_slots_are_per_tab() {
        let (gates, mut rx) = manager(None);

        let tab_a = spawn_open(&gates, "tab-a", GateKind::SwitchChain, json!({})).await;
        next_gate_event(&mut rx).await;
        let tab_b = spawn_open(&gates, "tab-b", GateKind::SwitchChain, json!({})).await;
        next_gate_event(&mut rx).await;

        assert_eq!(gates.list().await.len(), 2);

        gates.reject("tab-b", GateKind::SwitchChain).await.unwrap();
        gates.approve("tab-a", GateKind::SwitchChain).await.unwrap();
        assert_eq!(tab_a.await.unwrap(), GateOutcome::Approved);
        assert_eq!(
            tab_b.await.unwrap(),
            GateOutcome::Rejected(RejectReason::User)
        );
    }

    #[tokio::test]
    async fn test_detach_page_rejects_whole_tab() {
        let (gates, mut rx) = manager(None);

        let sign = spawn_open(&gates, "tab-1", GateKind::SignMessage, json!({})).await;
        next_gate_event(&mut rx).await;
        let send = spawn_open(&gates, "tab-1", GateKind::SendTransaction, json!({})).await;
        next_gate_event(&mut rx).await;
        let other = spawn_open(&gates, "tab-2", GateKind::SignMessage, json!({})).await;
        next_gate_event(&mut rx).await;

        assert_eq!(gates.detach_page("tab-1").await, 2);
        assert_eq!(
            sign.await.unwrap(),
            GateOutcome::Rejected(RejectReason::TabClosed)
        );
        assert_eq!(
            send.await.unwrap(),
            GateOutcome::Rejected(RejectReason::TabClosed)
        );

        assert!(gates.get("tab-2", GateKind::SignMessage).await.is_some());
        gates.approve("tab-2", GateKind::SignMessage).await.unwrap();
        assert_eq!(other.await.unwrap(), GateOutcome::Approved);
    }

    #[tokio::test]
    async fn test_unknown_tab_is_rejected_without_modal() {
        let (gates, mut rx) = manager(None);

        let outcome = gates.open(&page("gone", 0), GateKind::SignMessage, json!({})).await;
        assert_eq!(outcome, GateOutcome::Rejected(RejectReason::TabClosed));
        assert!(gates.list().await.is_empty());
        assert!(rx.try_recv().is_err());

        gates.attach_page("tab-1", 0).await;
        gates.detach_page("tab-1").await;
        let outcome = gates.open(&page("tab-1", 0), GateKind::Connect, json!({})).await;
        assert_eq!(outcome, GateOutcome::Rejected(RejectReason::TabClosed));
        assert!(gates.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_new_page_voids_old_page() {
        let (gates, mut rx) = manager(None);

        let old = spawn_open(&gates, "tab-1", GateKind::SendTransaction, json!({})).await;
        next_gate_event(&mut rx).await;

        assert_eq!(gates.attach_page("tab-1", 1).await, 1);
        assert_eq!(
            old.await.unwrap(),
            GateOutcome::Rejected(RejectReason::TabClosed)
        );

        let stale = gates.open(&page("tab-1", 0), GateKind::SignMessage, json!({})).await;
        assert_eq!(stale, GateOutcome::Rejected(RejectReason::TabClosed));
        assert!(gates.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_gate_from_newer_page_survives_late_attach() {
        let (gates, mut rx) = manager(None);
        gates.attach_page("tab-1", 0).await;

        let waiter = {
            let gates = gates.clone();
            let newer = page("tab-1", 1);
            tokio::spawn(async move { gates.open(&newer, GateKind::Connect, json!({})).await })
        };
        next_gate_event(&mut rx).await;

        assert_eq!(gates.attach_page("tab-1", 1).await, 0);
        gates.approve("tab-1", GateKind::Connect).await.unwrap();
        assert_eq!(waiter.await.unwrap(), GateOutcome::Approved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_rejects() {
        let (gates, _rx) = manager(Some(Duration::from_secs(30)));
        gates.attach_page("tab-1", 0).await;

        let outcome = gates.open(&page("tab-1", 0), GateKind::AddChain, json!({})).await;
        assert_eq!(outcome, GateOutcome::Rejected(RejectReason::Timeout));
        assert!(gates.list().await.is_empty());
    }
}
