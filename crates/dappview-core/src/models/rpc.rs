//! JSON-RPC 2.0 envelopes shared by the page protocol and the embedder IPC

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Error code used for chain switch/add failures and rejections.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: RequestId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: RequestId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::application_error(-32700, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::application_error(-32600, message)
    }

    pub fn method_not_supported() -> Self {
        Self::application_error(-32601, "Method not supported")
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::application_error(-32601, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::application_error(-32602, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::application_error(-32603, message)
    }

    pub fn unrecognized_chain(message: impl Into<String>) -> Self {
        Self::application_error(UNRECOGNIZED_CHAIN, message)
    }

    pub fn application_error(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)
    }
}

impl Request {
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    pub fn validate(&self) -> Result<(), RpcError> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(RpcError::invalid_request("Invalid JSON-RPC version"));
        }
        if self.method.trim().is_empty() {
            return Err(RpcError::invalid_request("Missing method"));
        }
        Ok(())
    }

    /// Positional params. Missing or null params are an empty list; a bare
    /// object (as some dApps send for `wallet_watchAsset`) becomes a single
    /// element.
    pub fn params_array(&self) -> Vec<Value> {
        match &self.params {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        }
    }
}

impl Response {
    pub fn success(result: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(error: RpcError, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Collapse into a `Result`. A response without `error` is a success even
    /// when `result` was `null` on the wire.
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_params() {
        let req: Request =
            serde_json::from_str(r#"{"id":7,"jsonrpc":"2.0","method":"eth_chainId"}"#).unwrap();
        assert_eq!(req.id, RequestId::Number(7));
        assert!(req.params_array().is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_request_object_params() {
        let req = Request::new(
            "wallet_watchAsset",
            Some(json!({"type": "ERC20"})),
            RequestId::Number(1),
        );
        assert_eq!(req.params_array(), vec![json!({"type": "ERC20"})]);
    }

    #[test]
    fn test_request_rejects_wrong_version() {
        let mut req = Request::new("eth_chainId", None, RequestId::Number(1));
        req.jsonrpc = "1.0".to_string();
        assert_eq!(req.validate().unwrap_err().code, -32600);
    }

    #[test]
    fn test_null_result_is_serialized() {
        let resp = Response::success(Value::Null, RequestId::Number(3));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"result\":null"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_null_result_round_trips_as_success() {
        let resp: Response =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":3,"result":null}"#).unwrap();
        assert_eq!(resp.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn test_method_not_supported() {
        let resp = Response::error(RpcError::method_not_supported(), RequestId::Number(9));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["error"]["code"], -32601);
        assert_eq!(value["error"]["message"], "Method not supported");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_request_id_types() {
        let req1 = Request::new("test", None, RequestId::Number(42));
        let req2 = Request::new("test", None, RequestId::String("abc".to_string()));

        let json1 = serde_json::to_string(&req1).unwrap();
        let json2 = serde_json::to_string(&req2).unwrap();

        assert!(json1.contains("\"id\":42"));
        assert!(json2.contains("\"id\":\"abc\""));
    }
}
