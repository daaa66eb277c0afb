// src/remote/client.rs

//! WebSocket implementation of the remote reload session.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

use super::protocol::{
    Request, Response, TargetList, JSONRPC_VERSION, METHOD_LIST_TARGETS, METHOD_RELOAD_SOURCES,
};
use super::{ReloadReport, ReloadSession, SessionConnector, TargetRef};
use crate::errors::{ReloadError, Result};

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

/// A live WebSocket session with the remote process.
///
/// Outgoing requests are numbered and parked in a pending map; a reader task
/// resolves each waiter as the matching response arrives.
pub struct WsSession {
    next_id: u64,
    out_tx: mpsc::UnboundedSender<Message>,
    pending: PendingMap,
    reader: JoinHandle<()>,
}

impl std::fmt::Debug for WsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsSession").finish()
    }
}

impl Drop for WsSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl WsSession {
    /// Connect to the remote control endpoint at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|err| ReloadError::Transport(format!("connecting to {url}: {err}")))?;
        let (mut write, mut read) = stream.split();

        // Writer task: serialises access to the sink half.
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
        });

        // Reader task: correlates responses back to their waiters.
        let pending: PendingMap = Arc::default();
        let reader_pending = Arc::clone(&pending);
        let reader = tokio::spawn(async move {
            while let Some(Ok(msg)) = read.next().await {
                let Message::Text(text) = msg else {
                    continue;
                };
                match serde_json::from_str::<Response>(&text) {
                    Ok(response) => {
                        let waiter = reader_pending.lock().ok().and_then(|mut map| {
                            map.remove(&response.id)
                        });
                        if let Some(tx) = waiter {
                            let _ = tx.send(response);
                        }
                    }
                    Err(err) => {
                        debug!(error = %err, "ignoring unparseable remote message");
                    }
                }
            }
            // Connection gone: dropping the waiters wakes every caller.
            if let Ok(mut map) = reader_pending.lock() {
                map.clear();
            }
        });

        debug!(url = %url, "remote reload session established");

        Ok(Self {
            next_id: 0,
            out_tx,
            pending,
            reader,
        })
    }

    async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;

        let (tx, rx) = oneshot::channel();
        if let Ok(mut map) = self.pending.lock() {
            map.insert(id, tx);
        }

        let request = Request {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.to_string(),
            params,
        };
        let text = serde_json::to_string(&request).map_err(anyhow::Error::from)?;

        if self.out_tx.send(Message::Text(text)).is_err() {
            if let Ok(mut map) = self.pending.lock() {
                map.remove(&id);
            }
            return Err(ReloadError::Transport("connection closed".into()));
        }

        let response = rx
            .await
            .map_err(|_| ReloadError::Transport("connection lost awaiting response".into()))?;

        if let Some(err) = response.error {
            return Err(ReloadError::Transport(format!(
                "remote error {}: {}",
                err.code, err.message
            )));
        }
        response
            .result
            .ok_or_else(|| ReloadError::Transport("response carried no result".into()))
    }
}

impl ReloadSession for WsSession {
    fn list_targets(&mut self) -> Pin<Box<dyn Future<Output = Result<Vec<TargetRef>>> + Send + '_>> {
        Box::pin(async move {
            let value = self.call(METHOD_LIST_TARGETS, Value::Null).await?;
            let list: TargetList = serde_json::from_value(value).map_err(|err| {
                ReloadError::Transport(format!("malformed {METHOD_LIST_TARGETS} response: {err}"))
            })?;
            Ok(list.targets)
        })
    }

    fn reload_sources<'a>(
        &'a mut self,
        target_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ReloadReport>> + Send + 'a>> {
        Box::pin(async move {
            let value = self
                .call(METHOD_RELOAD_SOURCES, json!({ "targetId": target_id }))
                .await?;
            let report: ReloadReport = serde_json::from_value(value).map_err(|err| {
                ReloadError::Transport(format!("malformed {METHOD_RELOAD_SOURCES} response: {err}"))
            })?;
            Ok(report)
        })
    }
}

/// Real session connector used in production.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl SessionConnector for WsConnector {
    fn connect<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn ReloadSession>>> + Send + 'a>> {
        Box::pin(async move {
            let session = WsSession::connect(url).await?;
            Ok(Box::new(session) as Box<dyn ReloadSession>)
        })
    }
}
