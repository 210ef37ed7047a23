//! Messages crossing the page/host boundary

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rpc::{Request, Response};

/// Host→page message. Every variant names the tab it is addressed to; the
/// provider of any other tab ignores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Response {
        #[serde(rename = "tabId")]
        tab_id: String,
        response: Response,
    },
    Event {
        #[serde(rename = "tabId")]
        tab_id: String,
        event: String,
        data: Value,
    },
    State {
        #[serde(rename = "tabId")]
        tab_id: String,
        #[serde(rename = "chainId")]
        chain_id: String,
        #[serde(rename = "selectedAddress")]
        selected_address: Option<String>,
    },
}

impl HostMessage {
    pub fn tab_id(&self) -> &str {
        match self {
            HostMessage::Response { tab_id, .. }
            | HostMessage::Event { tab_id, .. }
            | HostMessage::State { tab_id, .. } => tab_id,
        }
    }

    pub fn response(tab_id: impl Into<String>, response: Response) -> Self {
        HostMessage::Response {
            tab_id: tab_id.into(),
            response,
        }
    }

    pub fn event(tab_id: impl Into<String>, event: impl Into<String>, data: Value) -> Self {
        HostMessage::Event {
            tab_id: tab_id.into(),
            event: event.into(),
            data,
        }
    }

    pub fn state(
        tab_id: impl Into<String>,
        chain_id: impl Into<String>,
        selected_address: Option<String>,
    ) -> Self {
        HostMessage::State {
            tab_id: tab_id.into(),
            chain_id: chain_id.into(),
            selected_address,
        }
    }
}

/// Page→host frame after parsing the raw string the page posted.
#[derive(Debug, Clone, PartialEq)]
pub enum PageFrame {
    Request(Request),
    Debug(DebugFrame),
}

/// Traffic mirrored by the shim for diagnostics. Never dispatched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugFrame {
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rpc::RequestId;
    use serde_json::json;

    #[test]
    fn test_response_message_shape() {
        let msg = HostMessage::response(
            "tab-1",
            Response::success(json!("0x1"), RequestId::Number(5)),
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "response");
        assert_eq!(value["tabId"], "tab-1");
        assert_eq!(value["response"]["id"], 5);
        assert_eq!(value["response"]["result"], "0x1");
    }

    #[test]
    fn test_state_message_round_trip() {
        let raw = r#"{"type":"state","tabId":"t","chainId":"0x89","selectedAddress":null}"#;
        let msg: HostMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.tab_id(), "t");
        assert_eq!(msg, HostMessage::state("t", "0x89", None));
    }

    #[test]
    fn test_event_message_shape() {
        let msg = HostMessage::event("t", "chainChanged", json!("0x1"));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "event");
        assert_eq!(value["event"], "chainChanged");
        assert_eq!(value["data"], "0x1");
    }
}
