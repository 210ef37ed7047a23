//! Rust twin of the injected `window.ethereum` provider.
//!
//! Outbound requests are handed to a channel as the raw strings a page would
//! post; whoever owns the other end forwards them with `page.message`. Host
//! messages for the tab are fed back through [`InPageProvider::deliver`].

use dappview_core::models::{HostMessage, Request, RequestId, Response};
use rand::Rng;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};

/// Largest integer a page script can represent exactly.
const MAX_SAFE_ID: i64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error("page reset")]
    PageReset,

    #[error("Transport closed")]
    TransportClosed,

    #[error("Malformed host message: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle returned by [`InPageProvider::on`], used to remove the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Default)]
struct ProviderState {
    chain_id: String,
    selected_address: Option<String>,
}

pub struct InPageProvider {
    tab_id: String,
    outbound: mpsc::UnboundedSender<String>,
    pending: Mutex<HashMap<i64, oneshot::Sender<Result<Value>>>>,
    listeners: Mutex<HashMap<String, Vec<(ListenerId, Listener)>>>,
    state: RwLock<ProviderState>,
    next_listener: AtomicU64,
}

impl InPageProvider {
    /// Create a provider for `tab_id`. The receiver yields the raw request
    /// frames the provider posts.
    pub fn new(
        tab_id: impl Into<String>,
        chain_id: impl Into<String>,
        selected_address: Option<String>,
    ) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbound, frames) = mpsc::unbounded_channel();
        let provider = Self {
            tab_id: tab_id.into(),
            outbound,
            pending: Mutex::new(HashMap::new()),
            listeners: Mutex::new(HashMap::new()),
            state: RwLock::new(ProviderState {
                chain_id: chain_id.into(),
                selected_address,
            }),
            next_listener: AtomicU64::new(1),
        };
        (provider, frames)
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    pub fn is_meta_mask(&self) -> bool {
        true
    }

    pub async fn chain_id(&self) -> String {
        self.state.read().await.chain_id.clone()
    }

    pub async fn selected_address(&self) -> Option<String> {
        self.state.read().await.selected_address.clone()
    }

    /// Send a request and wait for the matching response. There is no timeout.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let (tx, rx) = oneshot::channel();

        let id = {
            let mut pending = self.pending.lock().await;
            let mut rng = rand::thread_rng();
            let id = loop {
                let candidate = rng.gen_range(1..=MAX_SAFE_ID);
                if !pending.contains_key(&candidate) {
                    break candidate;
                }
            };
            pending.insert(id, tx);
            id
        };

        let request = Request::new(
            method,
            Some(params.unwrap_or_else(|| json!([]))),
            RequestId::Number(id),
        );
        let frame = serde_json::to_string(&request)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if self.outbound.send(frame).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(ProviderError::TransportClosed);
        }

        rx.await.unwrap_or(Err(ProviderError::TransportClosed))
    }

    /// Register a callback for an event name.
    pub async fn on<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.lock().await;
        listeners
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    pub async fn remove_listener(&self, event: &str, id: ListenerId) {
        let mut listeners = self.listeners.lock().await;
        if let Some(callbacks) = listeners.get_mut(event) {
            callbacks.retain(|(listener, _)| *listener != id);
            if callbacks.is_empty() {
                listeners.remove(event);
            }
        }
    }

    /// Invoke every callback for `event` in registration order.
    pub async fn emit(&self, event: &str, data: &Value) {
        let callbacks: Vec<Listener> = {
            let listeners = self.listeners.lock().await;
            match listeners.get(event) {
                Some(callbacks) => callbacks.iter().map(|(_, cb)| cb.clone()).collect(),
                None => return,
            }
        };
        for callback in callbacks {
            callback(data);
        }
    }

    pub async fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().await.get(event).map_or(0, Vec::len)
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Apply a host message. Returns false when it was addressed to another
    /// tab or matched nothing in flight.
    pub async fn deliver(&self, message: HostMessage) -> bool {
        if message.tab_id() != self.tab_id {
            return false;
        }

        match message {
            HostMessage::Response { response, .. } => self.settle(response).await,
            HostMessage::Event { event, data, .. } => {
                self.emit(&event, &data).await;
                true
            }
            HostMessage::State {
                chain_id,
                selected_address,
                ..
            } => {
                let mut state = self.state.write().await;
                state.chain_id = chain_id;
                state.selected_address = selected_address;
                true
            }
        }
    }

    /// Parse and apply the `data` of a `message` event.
    pub async fn deliver_raw(&self, raw: &str) -> Result<bool> {
        let message: HostMessage =
            serde_json::from_str(raw).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(self.deliver(message).await)
    }

    /// Navigation or reload: everything in flight fails.
    pub async fn reset(&self) -> usize {
        let drained: Vec<_> = self.pending.lock().await.drain().collect();
        let count = drained.len();
        for (_, tx) in drained {
            let _ = tx.send(Err(ProviderError::PageReset));
        }
        count
    }

    async fn settle(&self, response: Response) -> bool {
        let id = match response.id {
            RequestId::Number(id) => id,
            _ => return false,
        };
        let Some(tx) = self.pending.lock().await.remove(&id) else {
            tracing::debug!("Dropping response for unknown request {}", id);
            return false;
        };

        let outcome = match response.error {
            Some(error) => Err(ProviderError::Rpc {
                code: error.code,
                message: error.message,
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };
        let _ = tx.send(outcome);
        true
    }
}
