//! Session gate: rate-limits how often a subscription emits analytics events.
//!
//! The gate is an injectable strategy so tests can swap the production
//! trailing-edge debounce for a synchronous pass-through and assert the
//! underlying dispatch logic directly.

use crate::dom::{ElementId, RawEvent};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Continuation invoked once an event clears the gate.
pub type Deliver = Arc<dyn Fn(RawEvent) + Send + Sync>;

/// Default debounce window for session events.
pub const SESSION_DEBOUNCE_MS: u64 = 500;

/// Strategy deciding when (and whether) a raw event reaches dispatch.
pub trait SessionGate: Send + Sync {
    /// Schedule delivery of `event` to `deliver`. Implementations may defer
    /// or collapse bursts; after [`cancel`](SessionGate::cancel) nothing may
    /// be delivered.
    fn pass(&self, event: RawEvent, deliver: Deliver);

    /// Stop the gate, dropping any scheduled deliveries.
    fn cancel(&self);
}

/// Identity gate: delivers synchronously on the calling thread.
pub struct PassthroughGate;

impl SessionGate for PassthroughGate {
    fn pass(&self, event: RawEvent, deliver: Deliver) {
        deliver(event);
    }

    fn cancel(&self) {}
}

type GateKey = (ElementId, String);

enum GateCommand {
    Schedule {
        key: GateKey,
        event: RawEvent,
        deliver: Deliver,
    },
    Cancel,
}

/// Trailing-edge debounce keyed per (element, event-name).
///
/// A burst of identical occurrences collapses into one delivery of the last
/// event, fired once the window elapses with no further calls. Scheduling is
/// handled by a dedicated timer thread fed over a channel; distinct keys
/// never collapse into each other.
pub struct DebounceGate {
    tx: Sender<GateCommand>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("beacon-debounce".to_string())
            .spawn(move || run_timer(rx, window))
            .expect("failed to spawn debounce timer thread");
        Self { tx }
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(SESSION_DEBOUNCE_MS))
    }
}

impl SessionGate for DebounceGate {
    fn pass(&self, event: RawEvent, deliver: Deliver) {
        let key = (event.target.id(), event.event_type.clone());
        // Send failure means the timer thread is gone (cancelled); drop.
        let _ = self.tx.send(GateCommand::Schedule {
            key,
            event,
            deliver,
        });
    }

    fn cancel(&self) {
        let _ = self.tx.send(GateCommand::Cancel);
    }
}

impl Drop for DebounceGate {
    fn drop(&mut self) {
        let _ = self.tx.send(GateCommand::Cancel);
    }
}

struct Pending {
    event: RawEvent,
    deliver: Deliver,
    deadline: Instant,
}

fn run_timer(rx: Receiver<GateCommand>, window: Duration) {
    let mut pending: HashMap<GateKey, Pending> = HashMap::new();

    loop {
        let now = Instant::now();
        let due: Vec<GateKey> = pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(k, _)| k.clone())
            .collect();
        for key in due {
            if let Some(p) = pending.remove(&key) {
                (p.deliver)(p.event);
            }
        }

        let received = match pending.values().map(|p| p.deadline).min() {
            Some(deadline) => {
                rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(GateCommand::Schedule {
                key,
                event,
                deliver,
            }) => {
                // Re-scheduling an existing key replaces the event and
                // restarts its window (trailing edge).
                pending.insert(
                    key,
                    Pending {
                        event,
                        deliver,
                        deadline: Instant::now() + window,
                    },
                );
            }
            Ok(GateCommand::Cancel) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}
