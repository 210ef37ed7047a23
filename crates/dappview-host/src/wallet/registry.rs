//! In-memory chain registry seeded from the config

use async_trait::async_trait;
use dappview_core::models::ChainDefinition;
use tokio::sync::RwLock;

use super::{ChainRegistry, Result, UpstreamError};

pub struct InMemoryChainRegistry {
    chains: RwLock<Vec<ChainDefinition>>,
    active: RwLock<ChainDefinition>,
}

impl InMemoryChainRegistry {
    pub fn new(chains: Vec<ChainDefinition>, active_chain_id: u64) -> Result<Self> {
        let active = chains
            .iter()
            .find(|c| c.chain_id == active_chain_id)
            .cloned()
            .ok_or(UpstreamError::UnknownChain(active_chain_id))?;

        Ok(Self {
            chains: RwLock::new(chains),
            active: RwLock::new(active),
        })
    }

    pub async fn list(&self) -> Vec<ChainDefinition> {
        self.chains.read().await.clone()
    }
}

#[async_trait]
impl ChainRegistry for InMemoryChainRegistry {
    async fn active_chain(&self) -> ChainDefinition {
        self.active.read().await.clone()
    }

    async fn get(&self, chain_id: u64) -> Option<ChainDefinition> {
        let chains = self.chains.read().await;
        chains.iter().find(|c| c.chain_id == chain_id).cloned()
    }

    async fn define_chains(&self, new_chains: Vec<ChainDefinition>) -> Result<()> {
        let mut chains = self.chains.write().await;
        for chain in new_chains {
            match chains.iter_mut().find(|c| c.chain_id == chain.chain_id) {
                Some(existing) => *existing = chain,
                None => chains.push(chain),
            }
        }
        Ok(())
    }

    async fn switch_active_chain(&self, chain_id: u64) -> Result<ChainDefinition> {
        let chain = self
            .get(chain_id)
            .await
            .ok_or(UpstreamError::UnknownChain(chain_id))?;

        *self.active.write().await = chain.clone();
        tracing::info!("Active chain is now {} ({})", chain.chain_name, chain.chain_id);
        Ok(chain)
    }
}
