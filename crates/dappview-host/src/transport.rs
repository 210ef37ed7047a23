//! Framing for the page/host channel.
//!
//! Page→host traffic is whatever string the page posted through the web
//! view's message bridge. Host→page traffic is a script the embedder evaluates
//! in the page; it dispatches a synthetic `message` event whose `data` is the
//! serialized [`HostMessage`].

use dappview_core::models::{DebugFrame, HostMessage, PageFrame, Request, RequestId, RpcError};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Payload is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("Payload is not a JSON object")]
    NotObject,

    #[error("Payload is neither a request nor a debug frame")]
    Unrecognized,

    /// Malformed request that still carries an id, so the page can be told.
    #[error("Invalid request: {error}")]
    InvalidRequest { id: RequestId, error: RpcError },
}

/// Parse a raw page payload.
pub fn parse_page_frame(raw: &str) -> Result<PageFrame, FrameError> {
    let value: Value = serde_json::from_str(raw.trim())?;
    let object = value.as_object().ok_or(FrameError::NotObject)?;

    if object.get("type").and_then(Value::as_str) == Some("debug") {
        let frame: DebugFrame = serde_json::from_value(value)?;
        return Ok(PageFrame::Debug(frame));
    }

    let id = match object.get("id") {
        Some(id) => serde_json::from_value::<RequestId>(id.clone())
            .map_err(|_| FrameError::Unrecognized)?,
        None => return Err(FrameError::Unrecognized),
    };

    if !object.get("method").is_some_and(Value::is_string) {
        return Err(FrameError::InvalidRequest {
            id,
            error: RpcError::invalid_request("Missing method"),
        });
    }

    let request: Request = serde_json::from_value(value).map_err(|e| FrameError::InvalidRequest {
        id: id.clone(),
        error: RpcError::invalid_request(e.to_string()),
    })?;

    request
        .validate()
        .map_err(|error| FrameError::InvalidRequest { id, error })?;

    Ok(PageFrame::Request(request))
}

/// Script that delivers `message` to the page's `message` listeners.
pub fn injection_script(message: &HostMessage) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(message)?;
    let literal = js_string_literal(&json)?;
    Ok(format!(
        "(function(){{try{{window.dispatchEvent(new MessageEvent('message',{{data:{}}}));}}catch(e){{}}}})();true;",
        literal
    ))
}

/// Encode `s` as a JavaScript string literal that cannot terminate the
/// surrounding script or string.
pub fn js_string_literal(s: &str) -> Result<String, serde_json::Error> {
    let quoted = serde_json::to_string(s)?;
    Ok(quoted
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
        .replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dappview_core::models::Response;
    use serde_json::json;

    #[test]
    fn test_parse_request() {
        let frame =
            parse_page_frame(r#"{"id":123,"jsonrpc":"2.0","method":"eth_chainId","params":[]}"#)
                .unwrap();
        match frame {
            PageFrame::Request(req) => {
                assert_eq!(req.id, RequestId::Number(123));
                assert_eq!(req.method, "eth_chainId");
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_parse_debug_frame() {
        let frame =
            parse_page_frame(r#"{"type":"debug","direction":"out","payload":{"id":1}}"#).unwrap();
        assert!(matches!(frame, PageFrame::Debug(ref d) if d.direction == "out"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_page_frame("not json"), Err(FrameError::NotJson(_))));
        assert!(matches!(parse_page_frame("[1,2]"), Err(FrameError::NotObject)));
        assert!(matches!(
            parse_page_frame(r#"{"hello":"world"}"#),
            Err(FrameError::Unrecognized)
        ));
    }

    #[test]
    fn test_malformed_request_keeps_id() {
        match parse_page_frame(r#"{"id":5,"jsonrpc":"2.0"}"#) {
            Err(FrameError::InvalidRequest { id, error }) => {
                assert_eq!(id, RequestId::Number(5));
                assert_eq!(error.code, -32600);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        match parse_page_frame(r#"{"id":6,"jsonrpc":"1.0","method":"eth_chainId"}"#) {
            Err(FrameError::InvalidRequest { id, .. }) => assert_eq!(id, RequestId::Number(6)),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_js_string_literal_escapes_breakouts() {
        let literal = js_string_literal("</script>\u{2028}\"'").unwrap();
        assert!(!literal.contains("</script>"));
        assert!(!literal.contains('\u{2028}'));
        assert!(literal.starts_with('"') && literal.ends_with('"'));
    }

    #[test]
    fn test_injection_script_embeds_message() {
        let message = HostMessage::response(
            "tab-9",
            Response::success(json!("0x1"), RequestId::Number(77)),
        );
        let script = injection_script(&message).unwrap();
        assert!(script.starts_with("(function(){"));
        assert!(script.ends_with("true;"));
        assert!(script.contains(r#"\"tabId\":\"tab-9\""#));
        assert!(script.contains(r#"\"id\":77"#));
    }
}
