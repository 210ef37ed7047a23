//! DappView Client Library
//!
//! Provides a client for driving the DappView host via Unix sockets, and
//! [`InPageProvider`], a Rust rendition of the provider injected into pages.

pub mod provider;

pub use dappview_core::models::{Notification, Request, RequestId, Response};
pub use provider::{InPageProvider, ListenerId, ProviderError};

use anyhow::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, WriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex, RwLock};

type PendingResponses = Arc<RwLock<HashMap<i64, mpsc::Sender<Response>>>>;

/// Persistent connection state
struct PersistentConnection {
    writer: Arc<Mutex<BufWriter<WriteHalf<UnixStream>>>>,
    pending_responses: PendingResponses,
}

/// DappView host client
pub struct DappViewClient {
    socket_path: String,
    request_counter: AtomicI64,
    persistent_conn: Arc<Mutex<Option<PersistentConnection>>>,
}

impl DappViewClient {
    /// Create a new client
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
            request_counter: AtomicI64::new(1),
            persistent_conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Start a persistent connection and subscribe to notifications.
    ///
    /// Returns a receiver for `page.inject`, `gate.event` and `tab.event`
    /// notifications. Later calls go over the same connection.
    pub async fn subscribe_notifications(&self) -> Result<mpsc::Receiver<Notification>> {
        let mut conn_lock = self.persistent_conn.lock().await;

        if conn_lock.is_some() {
            anyhow::bail!("Already subscribed to notifications");
        }

        let stream = self.connect().await?;
        let (read_half, write_half) = tokio::io::split(stream);
        let writer = Arc::new(Mutex::new(BufWriter::new(write_half)));

        let (notif_tx, notif_rx) = mpsc::channel::<Notification>(100);
        let pending_responses: PendingResponses = Arc::new(RwLock::new(HashMap::new()));

        let pending = pending_responses.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        // Notifications carry a method, responses an id
                        if let Ok(notification) = serde_json::from_str::<Notification>(&line) {
                            let _ = notif_tx.send(notification).await;
                        } else if let Ok(response) = serde_json::from_str::<Response>(&line) {
                            if let RequestId::Number(id) = response.id {
                                let pending = pending.read().await;
                                if let Some(tx) = pending.get(&id) {
                                    let _ = tx.send(response).await;
                                }
                            }
                        } else {
                            tracing::debug!("Ignoring unparsable line from host: {}", line.trim());
                        }
                    }
                }
            }
        });

        *conn_lock = Some(PersistentConnection {
            writer,
            pending_responses,
        });

        Ok(notif_rx)
    }

    /// Send a request using the persistent connection (if available)
    async fn call_persistent(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        let conn = {
            let conn_lock = self.persistent_conn.lock().await;
            conn_lock
                .as_ref()
                .map(|conn| (conn.writer.clone(), conn.pending_responses.clone()))
        };

        let Some((writer, pending_responses)) = conn else {
            return self.call_oneshot(method, params).await;
        };

        let request_id = self.next_id();
        let request = Request::new(method, params, RequestId::Number(request_id));

        let (tx, mut rx) = mpsc::channel::<Response>(1);
        pending_responses.write().await.insert(request_id, tx);

        {
            let mut writer = writer.lock().await;
            let request_json = serde_json::to_string(&request)?;
            writer.write_all(request_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        let response = rx.recv().await;
        pending_responses.write().await.remove(&request_id);
        let response = response.ok_or_else(|| anyhow::anyhow!("No response received"))?;

        into_result(response)
    }

    /// Send a one-shot request (creates new connection)
    async fn call_oneshot(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        let mut stream = self.connect().await?;
        let request = Request::new(method, params, RequestId::Number(self.next_id()));

        let request_json = serde_json::to_string(&request)?;
        stream.write_all(request_json.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;

        // The host may push notifications before answering; skip them
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                anyhow::bail!("Connection closed before a response arrived");
            }
            if let Ok(response) = serde_json::from_str::<Response>(&line) {
                if response.id == request.id {
                    return into_result(response);
                }
            }
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        Ok(UnixStream::connect(&self.socket_path).await?)
    }

    fn next_id(&self) -> i64 {
        self.request_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Send a request and receive a response.
    /// If a persistent connection is active it is used, otherwise a one-shot connection.
    pub async fn call(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        self.call_persistent(method, params).await
    }

    // Tab methods

    pub async fn tab_open(&self, url: &str) -> Result<Value> {
        self.call("tab.open", Some(json!({ "url": url }))).await
    }

    /// Close a tab, rejecting its pending confirmations
    pub async fn tab_close(&self, tab_id: &str) -> Result<Value> {
        self.call("tab.close", Some(json!({ "tab_id": tab_id }))).await
    }

    pub async fn tab_navigate(&self, tab_id: &str, url: &str) -> Result<Value> {
        self.call("tab.navigate", Some(json!({ "tab_id": tab_id, "url": url })))
            .await
    }

    pub async fn tab_update(
        &self,
        tab_id: &str,
        title: Option<&str>,
        favicon: Option<&str>,
    ) -> Result<Value> {
        self.call(
            "tab.update",
            Some(json!({
                "tab_id": tab_id,
                "title": title,
                "favicon": favicon,
            })),
        )
        .await
    }

    pub async fn tab_activate(&self, tab_id: &str) -> Result<Value> {
        self.call("tab.activate", Some(json!({ "tab_id": tab_id }))).await
    }

    pub async fn tab_list(&self) -> Result<Value> {
        self.call("tab.list", None).await
    }

    // Page methods

    /// Forward a raw string posted by a page. The answer arrives as a
    /// `page.inject` notification.
    pub async fn page_message(&self, tab_id: &str, data: &str) -> Result<Value> {
        self.call("page.message", Some(json!({ "tab_id": tab_id, "data": data })))
            .await
    }

    /// Script to evaluate at document start in a tab's web view
    pub async fn page_provider_script(&self, tab_id: &str) -> Result<String> {
        let result = self
            .call("page.provider_script", Some(json!({ "tab_id": tab_id })))
            .await?;
        result["script"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Response has no script"))
    }

    // Gate methods

    pub async fn gate_list(&self) -> Result<Value> {
        self.call("gate.list", None).await
    }

    pub async fn gate_approve(&self, tab_id: &str, kind: &str) -> Result<Value> {
        self.call("gate.approve", Some(json!({ "tab_id": tab_id, "kind": kind })))
            .await
    }

    pub async fn gate_reject(&self, tab_id: &str, kind: &str) -> Result<Value> {
        self.call("gate.reject", Some(json!({ "tab_id": tab_id, "kind": kind })))
            .await
    }

    // Wallet methods

    pub async fn wallet_status(&self) -> Result<Value> {
        self.call("wallet.status", None).await
    }

    pub async fn wallet_assets(&self) -> Result<Value> {
        self.call("wallet.assets", None).await
    }

    pub async fn wallet_disconnect(&self) -> Result<Value> {
        self.call("wallet.disconnect", None).await
    }

    // Config methods

    pub async fn config_get(&self) -> Result<Value> {
        self.call("config.get", None).await
    }
}

fn into_result(response: Response) -> Result<Value> {
    if let Some(error) = response.error {
        anyhow::bail!("RPC error {}: {}", error.code, error.message);
    }
    Ok(response.result.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dappview_core::models::RpcError;

    #[test]
    fn test_into_result() {
        let ok = Response::success(json!({"status": "closed"}), RequestId::Number(1));
        assert_eq!(into_result(ok).unwrap()["status"], "closed");

        let err = Response::error(RpcError::method_not_found("tab.explode"), RequestId::Number(2));
        let message = into_result(err).unwrap_err().to_string();
        assert!(message.starts_with("RPC error -32601"));
    }

    #[test]
    fn test_request_ids_increase() {
        let client = DappViewClient::new("/tmp/nowhere.sock");
        let first = client.next_id();
        assert_eq!(client.next_id(), first + 1);
    }

    #[tokio::test]
    async fn test_call_without_host_fails() {
        let dir = std::env::temp_dir().join(format!("dappview-missing-{}", std::process::id()));
        let client = DappViewClient::new(dir.join("host.sock").to_string_lossy().to_string());
        assert!(client.tab_list().await.is_err());
    }
}
