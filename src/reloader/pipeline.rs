// src/reloader/pipeline.rs

//! Internal wiring of the reloader: the fan-in pump, the batch-driven
//! reload driver, the broadcast hub, and the shared remote session slot.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tokio::sync::{broadcast, mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{ReloadError, Result};
use crate::remote::{ReloadSession, SessionConnector};
use crate::types::ChangeEvent;

const BROADCAST_CAPACITY: usize = 256;

/// Owns the two public broadcast streams.
///
/// Both senders live inside `Option`s so that closing — dropping the senders
/// — happens exactly once and is observable to receivers as end-of-stream.
pub(crate) struct StreamHub {
    change_tx: Mutex<Option<broadcast::Sender<ChangeEvent>>>,
    reload_tx: Mutex<Option<broadcast::Sender<SystemTime>>>,
}

impl StreamHub {
    pub(crate) fn new() -> Self {
        let (change_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (reload_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            change_tx: Mutex::new(Some(change_tx)),
            reload_tx: Mutex::new(Some(reload_tx)),
        }
    }

    pub(crate) fn publish_change(&self, event: &ChangeEvent) {
        let Ok(guard) = self.change_tx.lock() else {
            return;
        };
        if let Some(tx) = guard.as_ref() {
            // A send error just means nobody is subscribed right now.
            let _ = tx.send(event.clone());
        }
    }

    pub(crate) fn publish_reload(&self, at: SystemTime) {
        let Ok(guard) = self.reload_tx.lock() else {
            return;
        };
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(at);
        }
    }

    pub(crate) fn subscribe_changes(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        self.change_tx
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|tx| tx.subscribe()))
    }

    pub(crate) fn subscribe_reloads(&self) -> Option<broadcast::Receiver<SystemTime>> {
        self.reload_tx
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|tx| tx.subscribe()))
    }

    /// Drop both senders. Idempotent; receivers drain delivered history and
    /// then observe closure.
    pub(crate) fn close(&self) {
        if let Ok(mut guard) = self.change_tx.lock() {
            guard.take();
        }
        if let Ok(mut guard) = self.reload_tx.lock() {
            guard.take();
        }
    }
}

/// The lazily-connected remote session, shared between the reload driver
/// task and manual `reload()` calls.
///
/// The async mutex doubles as the single-flight guard: overlapping reload
/// attempts serialise on the session rather than racing on one connection.
pub(crate) struct RemoteHandle {
    pub(crate) url: String,
    pub(crate) connector: Box<dyn SessionConnector>,
    pub(crate) session: AsyncMutex<Option<Box<dyn ReloadSession>>>,
}

impl RemoteHandle {
    pub(crate) fn new(url: String, connector: Box<dyn SessionConnector>) -> Self {
        Self {
            url,
            connector,
            session: AsyncMutex::new(None),
        }
    }
}

/// Connect if needed, pick the first listed target, and ask it to reload.
///
/// On success the completion timestamp is published on the reload stream and
/// returned. A transport failure discards the held session so the next
/// attempt reconnects.
pub(crate) async fn perform_reload(remote: &RemoteHandle, hub: &StreamHub) -> Result<SystemTime> {
    let mut slot = remote.session.lock().await;

    if slot.is_none() {
        debug!(url = %remote.url, "connecting to remote reload service");
        *slot = Some(remote.connector.connect(&remote.url).await?);
    }
    let Some(session) = slot.as_mut() else {
        return Err(ReloadError::Transport("session unavailable".into()));
    };

    match request_reload(session.as_mut()).await {
        Ok(report) if report.success => {
            let at = SystemTime::now();
            hub.publish_reload(at);
            info!("hot reload completed");
            Ok(at)
        }
        Ok(report) => Err(ReloadError::ReloadRejected {
            detail: report.detail,
        }),
        Err(err) => {
            if matches!(err, ReloadError::Transport(_)) {
                // Broken session; discard so the next attempt reconnects.
                slot.take();
            }
            Err(err)
        }
    }
}

async fn request_reload(
    session: &mut dyn ReloadSession,
) -> Result<crate::remote::ReloadReport> {
    let targets = session.list_targets().await?;
    // Only the first listed target is ever reloaded.
    let Some(target) = targets.first() else {
        return Err(ReloadError::NoReloadTarget);
    };
    debug!(target = %target.id, "issuing reload against first listed target");
    session.reload_sources(&target.id).await
}

/// Forward raw change events to the broadcast stream and the debouncer.
pub(crate) async fn pump_events(
    mut fanin_rx: mpsc::Receiver<ChangeEvent>,
    hub: Arc<StreamHub>,
    debounce_tx: mpsc::Sender<ChangeEvent>,
) {
    while let Some(event) = fanin_rx.recv().await {
        debug!(?event, "change event received");
        hub.publish_change(&event);
        if debounce_tx.send(event).await.is_err() {
            break;
        }
    }
    debug!("change event pump finished");
}

/// Issue one reload per debounced batch.
///
/// Batches are handled one at a time; a batch arriving while a reload is in
/// flight waits in the channel instead of racing on the connection.
pub(crate) async fn drive_reloads(
    mut batches_rx: mpsc::Receiver<Vec<ChangeEvent>>,
    remote: Arc<RemoteHandle>,
    hub: Arc<StreamHub>,
) {
    while let Some(batch) = batches_rx.recv().await {
        info!(events = batch.len(), "change batch detected; requesting reload");
        if let Err(err) = perform_reload(&remote, &hub).await {
            warn!(error = %err, "reload request failed");
        }
    }
    debug!("reload driver loop finished");
}

/// Join handles for the internal tasks; aborted at termination.
pub(crate) struct Pipeline {
    tasks: Vec<JoinHandle<()>>,
}

impl Pipeline {
    pub(crate) fn new(tasks: Vec<JoinHandle<()>>) -> Self {
        Self { tasks }
    }

    pub(crate) async fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
            let _ = task.await;
        }
    }
}
