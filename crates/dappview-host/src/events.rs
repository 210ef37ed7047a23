use chrono::{DateTime, Utc};
use dappview_core::models::{HostMessage, Tab};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gate::{GateKind, PendingConfirmation, RejectReason};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum BridgeEvent {
    Inject(InjectEvent),
    Gate(GateEvent),
    Tab(TabEvent),
}

/// A message for one tab's page, plus the script that delivers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectEvent {
    pub tab_id: String,
    pub message: HostMessage,
    pub script: String,
    pub timestamp: DateTime<Utc>,
}

impl InjectEvent {
    pub fn new(message: HostMessage, script: String) -> Self {
        Self {
            tab_id: message.tab_id().to_string(),
            message,
            script,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateEvent {
    pub event_type: GateEventType,
    pub gate_id: String,
    pub tab_id: String,
    pub kind: GateKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateEventType {
    Opened {
        details: Value,
    },
    Closed {
        approved: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<RejectReason>,
    },
}

impl GateEvent {
    pub fn opened(pending: &PendingConfirmation) -> Self {
        Self {
            event_type: GateEventType::Opened {
                details: pending.details.clone(),
            },
            gate_id: pending.gate_id.clone(),
            tab_id: pending.tab_id.clone(),
            kind: pending.kind,
            timestamp: Utc::now(),
        }
    }

    pub fn closed(pending: &PendingConfirmation, reason: Option<RejectReason>) -> Self {
        Self {
            event_type: GateEventType::Closed {
                approved: reason.is_none(),
                reason,
            },
            gate_id: pending.gate_id.clone(),
            tab_id: pending.tab_id.clone(),
            kind: pending.kind,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabEvent {
    pub event_type: TabEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<Tab>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabEventType {
    Opened,
    Updated,
    Navigated,
    Activated,
    Closed { tab_id: String },
}

impl TabEvent {
    pub fn opened(tab: Tab) -> Self {
        Self::with_tab(TabEventType::Opened, tab)
    }

    pub fn updated(tab: Tab) -> Self {
        Self::with_tab(TabEventType::Updated, tab)
    }

    pub fn navigated(tab: Tab) -> Self {
        Self::with_tab(TabEventType::Navigated, tab)
    }

    pub fn activated(tab: Tab) -> Self {
        Self::with_tab(TabEventType::Activated, tab)
    }

    pub fn closed(tab_id: String) -> Self {
        Self {
            event_type: TabEventType::Closed { tab_id },
            tab: None,
            timestamp: Utc::now(),
        }
    }

    fn with_tab(event_type: TabEventType, tab: Tab) -> Self {
        Self {
            event_type,
            tab: Some(tab),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gate_closed_serialization() {
        let pending = PendingConfirmation {
            gate_id: "g1".to_string(),
            tab_id: "t1".to_string(),
            kind: GateKind::SwitchChain,
            details: json!({"chainId": "0x89"}),
            opened_at: Utc::now(),
        };

        let event = BridgeEvent::Gate(GateEvent::closed(&pending, Some(RejectReason::User)));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["category"], "gate");
        assert_eq!(value["kind"], "switch_chain");
        assert_eq!(value["event_type"]["type"], "closed");
        assert_eq!(value["event_type"]["approved"], false);
        assert_eq!(value["event_type"]["reason"], "user");
    }

    #[test]
    fn test_tab_event_serialization() {
        let tab = Tab::new("https://zora.co").unwrap();
        let event = TabEvent::opened(tab.clone());
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: TabEvent = serde_json::from_str(&json).unwrap();

        assert!(matches!(deserialized.event_type, TabEventType::Opened));
        assert_eq!(deserialized.tab.unwrap().id, tab.id);
    }
}
