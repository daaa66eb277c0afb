// src/remote/mod.rs

//! Client side of the remote reload protocol.
//!
//! The reloader talks to a [`ReloadSession`] instead of a raw WebSocket.
//! This makes it easy to swap in a scripted fake in tests while keeping the
//! production implementation in [`client`].
//!
//! - [`WsConnector`] / [`WsSession`] are the default implementations used by
//!   `watchreload`, speaking JSON messages over a WebSocket.
//! - Tests can provide their own [`SessionConnector`] that, for example,
//!   records reload calls and returns scripted outcomes.

pub mod client;
pub mod protocol;

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub use client::{WsConnector, WsSession};
pub use protocol::{ReloadReport, TargetRef};

/// An established session with the remote process.
pub trait ReloadSession: Send {
    /// Ordered list of isolate/target references exposed by the remote
    /// process.
    fn list_targets(&mut self) -> Pin<Box<dyn Future<Output = Result<Vec<TargetRef>>> + Send + '_>>;

    /// Ask the remote process to reload the code of one target.
    fn reload_sources<'a>(
        &'a mut self,
        target_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ReloadReport>> + Send + 'a>>;
}

/// Trait abstracting how a [`ReloadSession`] is established.
pub trait SessionConnector: Send + Sync {
    fn connect<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn ReloadSession>>> + Send + 'a>>;
}
