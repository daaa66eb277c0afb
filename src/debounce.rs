// src/debounce.rs

//! Debounced aggregation of change events.
//!
//! Folds a bursty stream of [`ChangeEvent`]s into batches, at most one batch
//! per configured interval. The eligibility/window bookkeeping lives in the
//! pure [`DebounceCore`] so it can be tested without Tokio; the async shell
//! around it is [`spawn_debouncer`].
//!
//! Semantics:
//! - Every incoming event is appended to an accumulation buffer.
//! - When an event arrives at or past the eligibility deadline, any events
//!   buffered so far are flushed first and a fresh window of `interval`
//!   length is opened.
//! - A timer flushes the buffer once the deadline passes without further
//!   input, so a burst is emitted at most `interval` after its first event.
//! - No event is ever dropped and no empty batch is ever emitted.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::types::ChangeEvent;

/// Pure debounce state machine.
///
/// All methods take an explicit `now` so tests can drive the clock by hand.
#[derive(Debug)]
pub struct DebounceCore {
    interval: Duration,
    buffer: Vec<ChangeEvent>,
    next_eligible: Instant,
}

impl DebounceCore {
    /// Create a core whose first event is eligible immediately.
    pub fn new(interval: Duration, now: Instant) -> Self {
        let next_eligible = now.checked_sub(interval).unwrap_or(now);
        Self {
            interval,
            buffer: Vec::new(),
            next_eligible,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Record an incoming event.
    ///
    /// If `now` has reached the eligibility deadline, previously buffered
    /// events are flushed and a new window starting at `now` is opened before
    /// the event is appended. Returns the flushed batch, if any.
    pub fn note_event(&mut self, event: ChangeEvent, now: Instant) -> Option<Vec<ChangeEvent>> {
        let flushed = if now >= self.next_eligible {
            self.next_eligible = now + self.interval;
            (!self.buffer.is_empty()).then(|| std::mem::take(&mut self.buffer))
        } else {
            None
        };
        self.buffer.push(event);
        flushed
    }

    /// Flush the buffer if `now` has reached the eligibility deadline.
    ///
    /// Never returns an empty batch.
    pub fn poll_flush(&mut self, now: Instant) -> Option<Vec<ChangeEvent>> {
        if self.buffer.is_empty() || now < self.next_eligible {
            return None;
        }
        self.next_eligible = now + self.interval;
        Some(std::mem::take(&mut self.buffer))
    }

    /// Instant at which the buffered events become flushable, if any are
    /// buffered at all.
    pub fn flush_deadline(&self) -> Option<Instant> {
        (!self.buffer.is_empty()).then_some(self.next_eligible)
    }

    /// Unconditionally hand back whatever is buffered (used on shutdown so
    /// trailing events are not lost).
    pub fn drain(&mut self) -> Option<Vec<ChangeEvent>> {
        (!self.buffer.is_empty()).then(|| std::mem::take(&mut self.buffer))
    }
}

/// Spawn the async debouncer loop.
///
/// Consumes events from `events_rx`, batches them through a [`DebounceCore`]
/// with the given `interval`, and forwards each batch to `batches_tx`. The
/// loop ends when `events_rx` closes; any still-buffered events are flushed
/// as a final batch on the way out.
pub fn spawn_debouncer(
    interval: Duration,
    mut events_rx: mpsc::Receiver<ChangeEvent>,
    batches_tx: mpsc::Sender<Vec<ChangeEvent>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut core = DebounceCore::new(interval, Instant::now());

        loop {
            let batch = match core.flush_deadline() {
                Some(deadline) => {
                    tokio::select! {
                        maybe = events_rx.recv() => match maybe {
                            Some(event) => core.note_event(event, Instant::now()),
                            None => break,
                        },
                        _ = tokio::time::sleep_until(deadline) => {
                            core.poll_flush(Instant::now())
                        }
                    }
                }
                None => match events_rx.recv().await {
                    Some(event) => core.note_event(event, Instant::now()),
                    None => break,
                },
            };

            if let Some(batch) = batch {
                debug!(events = batch.len(), "debounce window flushed");
                if batches_tx.send(batch).await.is_err() {
                    return;
                }
            }
        }

        // Input closed; flush whatever is left so no event is dropped.
        if let Some(batch) = core.drain() {
            let _ = batches_tx.send(batch).await;
        }
        debug!("debouncer loop finished");
    })
}
