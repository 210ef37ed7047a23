//! Browser tab model

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tab {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub favicon: Option<String>,
    /// Pages loaded so far, bumped on every navigation
    #[serde(default)]
    pub page: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tab {
    /// Create a new tab with a fresh id
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let now = Utc::now();
        let tab = Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            title: None,
            favicon: None,
            page: 0,
            created_at: now,
            updated_at: now,
        };
        tab.validate()?;
        Ok(tab)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("Tab ID cannot be empty".to_string()));
        }

        validate_url(&self.url)?;

        if let Some(ref favicon) = self.favicon {
            if favicon.trim().is_empty() {
                return Err(Error::Validation("Favicon cannot be empty".to_string()));
            }
        }

        Ok(())
    }

    /// Point the tab at a new page. Title and favicon belong to the old page.
    pub fn navigate(&mut self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        validate_url(&url)?;
        self.url = url;
        self.title = None;
        self.favicon = None;
        self.page += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_metadata(&mut self, title: Option<String>, favicon: Option<String>) {
        if title.is_some() {
            self.title = title;
        }
        if favicon.is_some() {
            self.favicon = favicon;
        }
        self.updated_at = Utc::now();
    }

    /// Origin (`scheme://host[:port]`) of the loaded page.
    pub fn origin(&self) -> &str {
        match self.url.find("://") {
            Some(scheme_end) => {
                let rest = &self.url[scheme_end + 3..];
                let host_end = rest.find('/').map(|i| scheme_end + 3 + i);
                match host_end {
                    Some(end) => &self.url[..end],
                    None => &self.url,
                }
            }
            None => &self.url,
        }
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(Error::Validation("Tab URL cannot be empty".to_string()));
    }

    if !(url.starts_with("https://") || url.starts_with("http://") || url == "about:blank") {
        return Err(Error::Validation(format!(
            "Tab URL must be http(s) or about:blank: {}",
            url
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tab() {
        let tab = Tab::new("https://app.uniswap.org/swap").unwrap();
        assert!(!tab.id.is_empty());
        assert!(tab.title.is_none());
        assert_eq!(tab.origin(), "https://app.uniswap.org");
    }

    #[test]
    fn test_tab_ids_are_unique() {
        let a = Tab::new("about:blank").unwrap();
        let b = Tab::new("about:blank").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_invalid_url() {
        assert!(Tab::new("").is_err());
        assert!(Tab::new("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_navigate_clears_metadata() {
        let mut tab = Tab::new("https://opensea.io").unwrap();
        tab.set_metadata(Some("OpenSea".to_string()), Some("https://opensea.io/favicon.ico".to_string()));
        assert_eq!(tab.title.as_deref(), Some("OpenSea"));

        tab.navigate("https://blur.io").unwrap();
        assert_eq!(tab.url, "https://blur.io");
        assert!(tab.title.is_none());
        assert!(tab.favicon.is_none());
        assert_eq!(tab.origin(), "https://blur.io");
        assert_eq!(tab.page, 1);
    }

    #[test]
    fn test_failed_navigation_keeps_page() {
        let mut tab = Tab::new("https://opensea.io").unwrap();
        assert!(tab.navigate("file:///etc/passwd").is_err());
        assert_eq!(tab.page, 0);
        assert_eq!(tab.url, "https://opensea.io");
    }
}
