use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use watchreload::errors::{ReloadError, Result};
use watchreload::remote::{ReloadReport, ReloadSession, SessionConnector, TargetRef};

/// Scripted behaviour for a fake remote session.
#[derive(Debug, Clone)]
pub enum ReloadOutcome {
    Success,
    Rejected(String),
    TransportError(String),
}

/// Observable call history of a [`FakeConnector`] and its sessions.
#[derive(Debug, Default)]
pub struct FakeRemoteState {
    pub connects: usize,
    pub list_calls: usize,
    /// Target ids passed to `reload_sources`, in call order.
    pub reload_calls: Vec<String>,
}

/// A fake session connector that:
/// - counts connections
/// - hands out sessions with a fixed target list
/// - answers every reload with a scripted outcome.
pub struct FakeConnector {
    state: Arc<Mutex<FakeRemoteState>>,
    targets: Vec<TargetRef>,
    outcome: ReloadOutcome,
}

impl FakeConnector {
    pub fn new(outcome: ReloadOutcome) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeRemoteState::default())),
            targets: vec![TargetRef {
                id: "targets/0".to_string(),
                name: Some("main".to_string()),
            }],
            outcome,
        }
    }

    /// Replace the target list handed to sessions.
    pub fn with_targets(mut self, targets: Vec<TargetRef>) -> Self {
        self.targets = targets;
        self
    }

    /// Shared handle onto the recorded call history.
    pub fn state(&self) -> Arc<Mutex<FakeRemoteState>> {
        Arc::clone(&self.state)
    }
}

impl SessionConnector for FakeConnector {
    fn connect<'a>(
        &'a self,
        _url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn ReloadSession>>> + Send + 'a>> {
        Box::pin(async move {
            self.state.lock().unwrap().connects += 1;
            Ok(Box::new(FakeSession {
                state: Arc::clone(&self.state),
                targets: self.targets.clone(),
                outcome: self.outcome.clone(),
            }) as Box<dyn ReloadSession>)
        })
    }
}

struct FakeSession {
    state: Arc<Mutex<FakeRemoteState>>,
    targets: Vec<TargetRef>,
    outcome: ReloadOutcome,
}

impl ReloadSession for FakeSession {
    fn list_targets(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TargetRef>>> + Send + '_>> {
        Box::pin(async move {
            self.state.lock().unwrap().list_calls += 1;
            Ok(self.targets.clone())
        })
    }

    fn reload_sources<'a>(
        &'a mut self,
        target_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ReloadReport>> + Send + 'a>> {
        Box::pin(async move {
            self.state
                .lock()
                .unwrap()
                .reload_calls
                .push(target_id.to_string());
            match self.outcome.clone() {
                ReloadOutcome::Success => Ok(ReloadReport {
                    success: true,
                    detail: String::new(),
                }),
                ReloadOutcome::Rejected(detail) => Ok(ReloadReport {
                    success: false,
                    detail,
                }),
                ReloadOutcome::TransportError(detail) => Err(ReloadError::Transport(detail)),
            }
        })
    }
}
