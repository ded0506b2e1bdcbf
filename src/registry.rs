//! Ordered handler table backing a tracker's subscriptions.

use crate::error::{Result, TrackerError};
use crate::types::{AnalyticsEvent, HandlerToken, SubscriptionKey};
use std::sync::Arc;

/// Callback invoked with each analytics event; return value is not consulted.
pub type EventHandler = Arc<dyn Fn(&AnalyticsEvent) + Send + Sync>;

/// One handler registration.
struct HandlerRecord {
    token: HandlerToken,
    key: SubscriptionKey,
    listener: EventHandler,
    #[allow(dead_code)]
    use_capture: bool,
}

/// Per-tracker table mapping subscription keys to ordered handler lists.
///
/// A single flat insertion-ordered list keeps both the global registration
/// order (for `handler_count`) and the per-key order (for dispatch) without
/// separate bookkeeping. Owned exclusively by one tracker.
pub struct ObservableRegistry {
    handlers: Vec<HandlerRecord>,
    next_token: u64,
    disposed: bool,
}

impl ObservableRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_token: 1,
            disposed: false,
        }
    }

    /// Append a handler to the ordered list for `key`.
    pub fn add_handler(
        &mut self,
        key: SubscriptionKey,
        listener: EventHandler,
        use_capture: bool,
    ) -> Result<HandlerToken> {
        if self.disposed {
            return Err(TrackerError::Disposed);
        }

        let token = HandlerToken(self.next_token);
        self.next_token += 1;
        self.handlers.push(HandlerRecord {
            token,
            key,
            listener,
            use_capture,
        });
        Ok(token)
    }

    /// Remove exactly one registration; no-op if already removed.
    pub fn remove_handler(&mut self, token: HandlerToken) {
        self.handlers.retain(|record| record.token != token);
    }

    /// Total registrations across all keys.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Registrations under one key.
    pub fn handler_count_for(&self, key: &SubscriptionKey) -> usize {
        self.handlers.iter().filter(|r| &r.key == key).count()
    }

    /// Snapshot of the ordered listener list for `key`.
    ///
    /// Dispatch happens on the snapshot, outside any lock, so handlers may
    /// re-enter the tracker.
    pub fn handlers_for(&self, key: &SubscriptionKey) -> Vec<EventHandler> {
        self.handlers
            .iter()
            .filter(|r| &r.key == key)
            .map(|r| Arc::clone(&r.listener))
            .collect()
    }

    /// Clear all registrations; the registry is unusable afterwards.
    pub fn dispose(&mut self) {
        self.handlers.clear();
        self.disposed = true;
    }
}

impl Default for ObservableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
