//! Concrete collaborators backed by HTTP services

pub mod decoder;
pub mod http;

pub use decoder::{HttpTxDecoder, NoopDecoder};
pub use http::{HttpChainClient, JsonRpcHttp};

use dappview_core::models::Config;
use std::sync::Arc;
use std::time::Duration;

use crate::wallet::{
    ChainClient, ChainRegistry, InMemoryChainRegistry, NodeWallet, Result, TxDecoder,
    WalletConnector,
};

/// Everything the dispatcher talks to outside the process.
#[derive(Clone)]
pub struct Upstream {
    pub chain: Arc<dyn ChainClient>,
    pub registry: Arc<dyn ChainRegistry>,
    pub connector: Arc<dyn WalletConnector>,
    pub decoder: Arc<dyn TxDecoder>,
}

impl Upstream {
    /// Node-backed collaborators: the active chain's RPC URL serves reads,
    /// and the node's managed accounts sign.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry: Arc<dyn ChainRegistry> = Arc::new(InMemoryChainRegistry::new(
            config.chains.clone(),
            config.default_chain_id,
        )?);
        let rpc = Arc::new(JsonRpcHttp::new()?);

        let chain = Arc::new(HttpChainClient::new(rpc.clone(), registry.clone()));
        let connector = Arc::new(NodeWallet::new(
            rpc,
            registry.clone(),
            config.wallet.account.clone(),
        ));

        let decoder: Arc<dyn TxDecoder> = match &config.decoder.url {
            Some(url) => Arc::new(HttpTxDecoder::new(
                url.clone(),
                Duration::from_millis(config.decoder.timeout_ms),
            )?),
            None => Arc::new(NoopDecoder),
        };

        Ok(Self {
            chain,
            registry,
            connector,
            decoder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_default_config() {
        let upstream = Upstream::from_config(&Config::default()).unwrap();
        assert_eq!(upstream.registry.active_chain().await.chain_id, 1);
    }

    #[test]
    fn test_unknown_default_chain() {
        let config = Config {
            default_chain_id: 10,
            ..Config::default()
        };
        assert!(Upstream::from_config(&config).is_err());
    }
}
