// tests/property_debounce.rs

//! Property tests for the pure debounce core: for any schedule of events and
//! flush checks, the concatenation of all emitted batches preserves every
//! event exactly once in arrival order, no batch is empty, and emissions are
//! spaced by at least the interval.

use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use watchreload::debounce::DebounceCore;
use watchreload::types::{ChangeEvent, ChangeKind};

#[derive(Debug, Clone)]
enum Step {
    /// Advance the simulated clock by this many milliseconds.
    Advance(u64),
    /// Feed the next event.
    Event,
    /// Run a timer-style flush check.
    Poll,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u64..250).prop_map(Step::Advance),
        Just(Step::Event),
        Just(Step::Poll),
    ]
}

fn kind_strategy() -> impl Strategy<Value = ChangeKind> {
    prop_oneof![
        Just(ChangeKind::Created),
        Just(ChangeKind::Modified),
        Just(ChangeKind::Removed),
    ]
}

proptest! {
    #[test]
    fn no_event_lost_and_order_preserved(
        steps in proptest::collection::vec(step_strategy(), 0..200),
        kinds in proptest::collection::vec(kind_strategy(), 200),
        interval_ms in 0u64..500,
    ) {
        let interval = Duration::from_millis(interval_ms);
        let start = Instant::now();
        let mut now = start;
        let mut core = DebounceCore::new(interval, now);

        let mut fed: Vec<ChangeEvent> = Vec::new();
        let mut emitted: Vec<Vec<ChangeEvent>> = Vec::new();
        let mut emission_times: Vec<Instant> = Vec::new();
        let mut next = 0usize;

        for step in steps {
            match step {
                Step::Advance(ms) => {
                    now += Duration::from_millis(ms);
                }
                Step::Event => {
                    let event = ChangeEvent::new(
                        format!("/w/file-{next}"),
                        kinds[next % kinds.len()],
                    );
                    fed.push(event.clone());
                    next += 1;
                    if let Some(batch) = core.note_event(event, now) {
                        emission_times.push(now);
                        emitted.push(batch);
                    }
                }
                Step::Poll => {
                    if let Some(batch) = core.poll_flush(now) {
                        emission_times.push(now);
                        emitted.push(batch);
                    }
                }
            }
        }
        if let Some(batch) = core.drain() {
            emitted.push(batch);
        }

        // Never an empty batch.
        for batch in &emitted {
            prop_assert!(!batch.is_empty());
        }

        // Concatenation reproduces the input exactly, in order.
        let replay: Vec<ChangeEvent> = emitted.into_iter().flatten().collect();
        prop_assert_eq!(replay, fed);

        // Timed emissions are spaced by at least the interval.
        for pair in emission_times.windows(2) {
            prop_assert!(pair[1] - pair[0] >= interval);
        }
    }
}
