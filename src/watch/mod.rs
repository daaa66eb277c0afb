// src/watch/mod.rs

//! Path watching.
//!
//! This module is responsible for:
//! - The [`PathWatcher`] backend abstraction over the platform watcher
//!   (`notify`), plus a mock backend for tests.
//! - The [`WatchRegistry`], which owns the set of registered paths and the
//!   per-path subscriptions that forward change events into a shared sink.
//!
//! It does **not** know about debouncing or reloads; it only turns
//! filesystem changes into [`ChangeEvent`]s on a channel.

pub mod backend;
pub mod mock;
pub mod registry;

pub use backend::{NotifyWatcher, PathWatcher, WatchSubscription};
pub use mock::MockWatcher;
pub use registry::{WatchRegistry, WatchedPath};

pub use crate::types::{ChangeEvent, ChangeKind};
