//! Process-wide wallet connection state shared by every tab

use alloy_primitives::Address;
use dappview_core::models::WatchedAsset;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::Signer;

pub struct WalletSession {
    signer: RwLock<Option<Arc<dyn Signer>>>,
    watched_assets: RwLock<Vec<WatchedAsset>>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self {
            signer: RwLock::new(None),
            watched_assets: RwLock::new(Vec::new()),
        }
    }

    pub async fn signer(&self) -> Option<Arc<dyn Signer>> {
        self.signer.read().await.clone()
    }

    pub async fn account(&self) -> Option<Address> {
        self.signer.read().await.as_ref().map(|s| s.address())
    }

    pub async fn is_connected(&self) -> bool {
        self.signer.read().await.is_some()
    }

    pub async fn connect(&self, signer: Arc<dyn Signer>) {
        tracing::info!("Wallet connected: {}", signer.address());
        *self.signer.write().await = Some(signer);
    }

    /// Drop the signer. Returns whether one was connected.
    pub async fn disconnect(&self) -> bool {
        let previous = self.signer.write().await.take();
        if previous.is_some() {
            tracing::info!("Wallet disconnected");
        }
        previous.is_some()
    }

    /// Add an asset unless one with the same address is already watched.
    pub async fn watch_asset(&self, asset: WatchedAsset) -> bool {
        let mut assets = self.watched_assets.write().await;
        if assets.iter().any(|a| a.same_address(&asset.address)) {
            return false;
        }
        assets.push(asset);
        true
    }

    pub async fn watched_assets(&self) -> Vec<WatchedAsset> {
        self.watched_assets.read().await.clone()
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSigner;

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let session = WalletSession::new();
        assert!(session.account().await.is_none());

        let signer = Arc::new(MockSigner::new(MockSigner::default_address()));
        session.connect(signer).await;
        assert_eq!(session.account().await, Some(MockSigner::default_address()));

        assert!(session.disconnect().await);
        assert!(!session.disconnect().await);
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_watch_asset_dedup() {
        let session = WalletSession::new();
        let asset = WatchedAsset {
            address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
            symbol: "USDC".to_string(),
            decimals: 6,
            image: None,
        };

        assert!(session.watch_asset(asset.clone()).await);
        let lowercase = WatchedAsset {
            address: asset.address.to_lowercase(),
            ..asset
        };
        assert!(!session.watch_asset(lowercase).await);
        assert_eq!(session.watched_assets().await.len(), 1);
    }
}
