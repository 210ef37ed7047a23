//! Central event management and broadcasting

use dappview_core::models::HostMessage;
use tokio::sync::broadcast;

use crate::events::{BridgeEvent, GateEvent, InjectEvent, TabEvent};
use crate::transport;

/// Central event manager that fans host events out to every embedder
pub struct EventManager {
    event_tx: broadcast::Sender<BridgeEvent>,
}

impl EventManager {
    /// Create a new event manager with a broadcast channel
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(1000);
        Self { event_tx }
    }

    /// Subscribe to all bridge events
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.event_tx.subscribe()
    }

    /// Deliver a message to one tab's page
    pub fn emit_inject(&self, message: HostMessage) {
        let script = match transport::injection_script(&message) {
            Ok(script) => script,
            Err(e) => {
                tracing::error!("Failed to encode message for tab {}: {}", message.tab_id(), e);
                return;
            }
        };

        tracing::debug!("Injecting {:?} into tab {}", kind_of(&message), message.tab_id());
        let _ = self
            .event_tx
            .send(BridgeEvent::Inject(InjectEvent::new(message, script)));
    }

    /// Emit a confirmation gate event
    pub fn emit_gate(&self, event: GateEvent) {
        tracing::info!(
            "EventManager: gate {} ({:?}) for tab {}: {:?}",
            event.gate_id,
            event.kind,
            event.tab_id,
            event.event_type
        );
        if self.event_tx.send(BridgeEvent::Gate(event)).is_err() {
            tracing::warn!("EventManager: no embedder is listening for gate events");
        }
    }

    /// Emit a tab event
    pub fn emit_tab(&self, event: TabEvent) {
        let _ = self.event_tx.send(BridgeEvent::Tab(event));
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_of(message: &HostMessage) -> &'static str {
    match message {
        HostMessage::Response { .. } => "response",
        HostMessage::Event { .. } => "event",
        HostMessage::State { .. } => "state",
    }
}
