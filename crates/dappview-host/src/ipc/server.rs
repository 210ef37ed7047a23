use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, ReadHalf, WriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};

use super::{Notification, Request, RequestId, Response, RpcError};
use crate::api::ApiHandler;
use crate::events::BridgeEvent;

#[derive(Debug, thiserror::Error)]
pub enum IpcServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, IpcServerError>;

type Reader = BufReader<ReadHalf<UnixStream>>;
type Writer = BufWriter<WriteHalf<UnixStream>>;

pub struct IpcServer {
    socket_path: PathBuf,
    api_handler: Arc<ApiHandler>,
}

impl IpcServer {
    pub fn new(socket_path: impl Into<PathBuf>, api_handler: Arc<ApiHandler>) -> Self {
        Self {
            socket_path: socket_path.into(),
            api_handler,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn start(self: Arc<Self>) -> Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("IPC server listening on {}", self.socket_path.display());

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream).await {
                            tracing::error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    async fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        tracing::debug!("New embedder connected");

        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);

        let (notif_tx, mut notif_rx) = mpsc::channel::<Notification>(100);
        let forwarder = tokio::spawn(forward_events(
            self.api_handler.subscribe_events(),
            notif_tx,
        ));

        loop {
            tokio::select! {
                result = read_line_from(&mut reader) => {
                    let response = match result {
                        Ok(line) => match serde_json::from_str::<Request>(&line) {
                            Ok(request) => {
                                tracing::debug!("handler: received request: {}", request.method);
                                self.handle_request(request).await
                            }
                            Err(e) => Response::error(RpcError::parse_error(e.to_string()), RequestId::Null),
                        },
                        Err(IpcServerError::Closed) => {
                            tracing::debug!("Embedder disconnected");
                            break;
                        }
                        Err(e) => {
                            tracing::error!("Failed to read request: {}", e);
                            break;
                        }
                    };
                    if let Err(e) = write_line_to(&mut writer, &response).await {
                        tracing::error!("Failed to write response: {}", e);
                        break;
                    }
                }
                Some(notification) = notif_rx.recv() => {
                    tracing::trace!("IPC: sending notification {}", notification.method);
                    if let Err(e) = write_line_to(&mut writer, &notification).await {
                        tracing::warn!("Failed to send notification: {}", e);
                        break;
                    }
                }
            }
        }

        forwarder.abort();
        Ok(())
    }

    async fn handle_request(&self, request: Request) -> Response {
        if let Err(error) = request.validate() {
            return Response::error(error, request.id);
        }

        match self
            .api_handler
            .handle(&request.method, request.params)
            .await
        {
            Ok(result) => Response::success(result, request.id),
            Err(error) => {
                tracing::debug!("{} failed: {}", request.method, error);
                Response::error(error.to_rpc_error(), request.id)
            }
        }
    }
}

/// Turn bridge events into embedder notifications until the embedder leaves.
async fn forward_events(
    mut event_rx: broadcast::Receiver<BridgeEvent>,
    notif_tx: mpsc::Sender<Notification>,
) {
    loop {
        let event = match event_rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("IPC: embedder lagging, dropped {} events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let notification = match to_notification(&event) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::error!("IPC: failed to encode event: {}", e);
                continue;
            }
        };

        if notif_tx.send(notification).await.is_err() {
            tracing::debug!("IPC: event forwarder stopping - embedder disconnected");
            break;
        }
    }
}

pub fn to_notification(event: &BridgeEvent) -> Result<Notification> {
    let (method, params) = match event {
        BridgeEvent::Inject(e) => ("page.inject", serde_json::to_value(e)?),
        BridgeEvent::Gate(e) => ("gate.event", serde_json::to_value(e)?),
        BridgeEvent::Tab(e) => ("tab.event", serde_json::to_value(e)?),
    };
    Ok(Notification::new(method, params))
}

async fn read_line_from(reader: &mut Reader) -> Result<String> {
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await?;

    if bytes_read == 0 {
        return Err(IpcServerError::Closed);
    }
    let line = line.trim();
    if line.is_empty() {
        return Err(IpcServerError::Closed);
    }
    Ok(line.to_string())
}

async fn write_line_to<T: serde::Serialize>(writer: &mut Writer, message: &T) -> Result<()> {
    let json = serde_json::to_string(message)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
