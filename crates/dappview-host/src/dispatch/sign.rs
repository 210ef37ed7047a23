//! `personal_sign` and `eth_signTypedData*`

use alloy_primitives::{hex, Address, Bytes};
use serde_json::{json, Value};

use super::{param, DispatchError, Dispatcher, Result};
use crate::gate::GateKind;
use crate::tab::PageContext;

fn as_address(value: &Value) -> Option<Address> {
    let s = value.as_str()?;
    if s.len() != 42 {
        return None;
    }
    s.parse().ok()
}

/// `0x`-prefixed hex is decoded; anything else is signed as UTF-8 text.
fn message_bytes(value: &Value) -> Result<Bytes> {
    let s = value
        .as_str()
        .ok_or_else(|| DispatchError::InvalidParams("Message must be a string".to_string()))?;
    if let Some(stripped) = s.strip_prefix("0x") {
        if let Ok(bytes) = hex::decode(stripped) {
            return Ok(Bytes::from(bytes));
        }
    }
    Ok(Bytes::copy_from_slice(s.as_bytes()))
}

/// Text shown in the modal: UTF-8 when it decodes, hex otherwise.
fn display_message(bytes: &Bytes) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => hex::encode_prefixed(bytes),
    }
}

/// Find the address among the first two params; the other one is the payload.
/// The conventional position is tried first.
fn split_address<'a>(params: &'a [Value], address_first: bool) -> Result<(Address, &'a Value)> {
    let first = param(params, 0, "first parameter")?;
    let second = param(params, 1, "second parameter")?;

    let (primary, fallback) = if address_first {
        ((first, second), (second, first))
    } else {
        ((second, first), (first, second))
    };

    for (candidate, payload) in [primary, fallback] {
        if let Some(address) = as_address(candidate) {
            return Ok((address, payload));
        }
    }
    Err(DispatchError::InvalidParams(
        "Missing signing address".to_string(),
    ))
}

pub(super) async fn personal_sign(
    ctx: &Dispatcher,
    page: &PageContext,
    params: &[Value],
) -> Result<Value> {
    let (address, message) = split_address(params, false)?;
    let message = message_bytes(message)?;
    let signer = ctx.signer_for(address).await?;

    let details = json!({
        "origin": page.origin,
        "address": address,
        "message": display_message(&message),
        "raw": message,
    });
    ctx.confirm(page, GateKind::SignMessage, details).await?;

    Ok(json!(signer.sign_message(&message).await?))
}

pub(super) async fn typed_data(
    ctx: &Dispatcher,
    page: &PageContext,
    params: &[Value],
) -> Result<Value> {
    let (address, payload) = split_address(params, true)?;
    let typed_data = match payload {
        Value::String(encoded) => serde_json::from_str(encoded)
            .map_err(|e| DispatchError::InvalidParams(format!("Invalid typed data: {}", e)))?,
        other => other.clone(),
    };
    let signer = ctx.signer_for(address).await?;

    let details = json!({
        "origin": page.origin,
        "address": address,
        "typedData": typed_data,
    });
    ctx.confirm(page, GateKind::SignTypedData, details).await?;

    Ok(json!(signer.sign_typed_data(&typed_data).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xabcdef0000000000000000000000000000000000";

    #[test]
    fn test_personal_sign_both_orders() {
        let standard = vec![json!("0x68656c6c6f"), json!(ADDR)];
        let (address, message) = split_address(&standard, false).unwrap();
        assert_eq!(address, ADDR.parse::<Address>().unwrap());
        assert_eq!(message, &json!("0x68656c6c6f"));

        let swapped = vec![json!(ADDR), json!("hello")];
        let (address, message) = split_address(&swapped, false).unwrap();
        assert_eq!(address, ADDR.parse::<Address>().unwrap());
        assert_eq!(message, &json!("hello"));
    }

    #[test]
    fn test_missing_address() {
        let params = vec![json!("hello"), json!("world")];
        assert!(matches!(
            split_address(&params, false),
            Err(DispatchError::InvalidParams(_))
        ));
        assert!(split_address(&[json!("hello")], false).is_err());
    }

    #[test]
    fn test_message_bytes() {
        assert_eq!(
            message_bytes(&json!("0x68656c6c6f")).unwrap().as_ref(),
            b"hello"
        );
        assert_eq!(message_bytes(&json!("hello")).unwrap().as_ref(), b"hello");
        assert_eq!(message_bytes(&json!("0xzz")).unwrap().as_ref(), b"0xzz");
        assert!(message_bytes(&json!(5)).is_err());
    }

    #[test]
    fn test_display_message() {
        assert_eq!(display_message(&Bytes::from_static(b"hi")), "hi");
        assert_eq!(display_message(&Bytes::from_static(&[0xff, 0xfe])), "0xfffe");
    }
}
