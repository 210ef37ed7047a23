//! Provider object injected into every embedded page before its own scripts run

use crate::transport::js_string_literal;

const PROVIDER_TEMPLATE: &str = include_str!("provider.js");

/// Render the provider script for one tab with the current session state baked in.
pub fn provider_script(
    tab_id: &str,
    chain_id: &str,
    selected_address: Option<&str>,
) -> Result<String, serde_json::Error> {
    let selected_address = match selected_address {
        Some(address) => js_string_literal(address)?,
        None => "null".to_string(),
    };

    Ok(PROVIDER_TEMPLATE
        .replace("__TAB_ID__", &js_string_literal(tab_id)?)
        .replace("__CHAIN_ID__", &js_string_literal(chain_id)?)
        .replace("__SELECTED_ADDRESS__", &selected_address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_filled() {
        let script = provider_script("tab-1", "0x89", None).unwrap();
        assert!(!script.contains("__TAB_ID__"));
        assert!(!script.contains("__CHAIN_ID__"));
        assert!(!script.contains("__SELECTED_ADDRESS__"));
        assert!(script.contains(r#"var TAB_ID = "tab-1";"#));
        assert!(script.contains(r#"chainId: "0x89","#));
        assert!(script.contains("selectedAddress: null,"));
    }

    #[test]
    fn test_selected_address_is_quoted() {
        let script = provider_script(
            "tab-1",
            "0x1",
            Some("0xABCDEF0000000000000000000000000000000000"),
        )
        .unwrap();
        assert!(script.contains(r#"selectedAddress: "0xABCDEF0000000000000000000000000000000000","#));
    }

    #[test]
    fn test_hostile_tab_id_cannot_escape() {
        let script = provider_script("</script><script>alert(1)", "0x1", None).unwrap();
        assert!(!script.contains("</script>"));
    }

    #[test]
    fn test_provider_surface() {
        let script = provider_script("t", "0x1", None).unwrap();
        for needle in [
            "isMetaMask: true",
            "request: function",
            "removeListener: function",
            "emit: function",
            "data.tabId !== TAB_ID",
            "eip6963:announceProvider",
        ] {
            assert!(script.contains(needle), "missing {}", needle);
        }
    }
}
