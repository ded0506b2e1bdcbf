//! Browser event tracker tying all components together.

use crate::dom::{
    ElementId, ElementRef, ElementResolver, ListenerHandle, NativeListener, RawEvent,
};
use crate::error::{Result, TrackerError};
use crate::gate::{DebounceGate, Deliver, SessionGate};
use crate::registry::{EventHandler, ObservableRegistry};
use crate::types::{AnalyticsEvent, HandlerToken, SubscriptionKey, TriggerConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// One resolved (selector-set, event-name) subscription.
struct Subscription {
    key: SubscriptionKey,
    /// Resolved once per key, in selector order.
    elements: Vec<ElementRef>,
}

/// An attached native listener, released on dispose.
struct NativeBinding {
    element: ElementRef,
    handle: ListenerHandle,
}

/// Mutable tracker state; `None` once disposed.
struct TrackerState {
    observables: ObservableRegistry,
    /// Arena of subscriptions in insertion order.
    subscriptions: Vec<Subscription>,
    /// At most one native listener per (element, event-name) pair.
    native: HashMap<(ElementId, String), NativeBinding>,
}

struct TrackerShared {
    state: Mutex<Option<TrackerState>>,
}

impl TrackerShared {
    /// Dispatch one gated occurrence to every handler whose subscription
    /// covers (target, event-type).
    fn on_session(&self, raw: &RawEvent) {
        // Snapshot matching handlers under the lock, invoke outside it so
        // handlers may re-enter the tracker.
        let batches: Vec<(AnalyticsEvent, Vec<EventHandler>)> = {
            let guard = self.state.lock();
            let state = match guard.as_ref() {
                Some(state) => state,
                // Disposed while the event was in the gate.
                None => return,
            };

            let target_id = raw.target.id();
            state
                .subscriptions
                .iter()
                .filter(|sub| {
                    sub.key.event == raw.event_type
                        && sub.elements.iter().any(|el| el.id() == target_id)
                })
                .map(|sub| {
                    let event = AnalyticsEvent::new(
                        Arc::clone(&raw.target),
                        raw.event_type.clone(),
                    );
                    (event, state.observables.handlers_for(&sub.key))
                })
                .collect()
        };

        for (event, handlers) in batches {
            for handler in handlers {
                handler(&event);
            }
        }
    }
}

/// Converts native browser events on selector-matched elements into
/// [`AnalyticsEvent`]s delivered to registered handlers.
///
/// Subscriptions are keyed by (normalized selector list, event name): the
/// first `add()` for a key resolves its elements and attaches native
/// listeners; later adds for the same key only append handlers. Element
/// resolution is delegated entirely to the [`ElementResolver`] collaborator.
pub struct BrowserEventTracker {
    resolver: Arc<dyn ElementResolver>,
    gate: Arc<dyn SessionGate>,
    shared: Arc<TrackerShared>,
    /// The one listener shared by every native attachment.
    native_listener: NativeListener,
}

impl BrowserEventTracker {
    /// Create a tracker with the production debounce gate.
    pub fn new(resolver: Arc<dyn ElementResolver>) -> Self {
        Self::with_gate(resolver, Arc::new(DebounceGate::default()))
    }

    /// Create a tracker with a custom session gate strategy.
    pub fn with_gate(
        resolver: Arc<dyn ElementResolver>,
        gate: Arc<dyn SessionGate>,
    ) -> Self {
        let shared = Arc::new(TrackerShared {
            state: Mutex::new(Some(TrackerState {
                observables: ObservableRegistry::new(),
                subscriptions: Vec::new(),
                native: HashMap::new(),
            })),
        });

        // Delivery re-checks liveness: a gated callback scheduled before
        // dispose() must not reach handlers after it.
        let deliver: Deliver = {
            let weak = Arc::downgrade(&shared);
            Arc::new(move |raw: RawEvent| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_session(&raw);
                }
            })
        };

        let native_listener: NativeListener = {
            let gate = Arc::clone(&gate);
            Arc::new(move |raw: &RawEvent| gate.pass(raw.clone(), Arc::clone(&deliver)))
        };

        Self {
            resolver,
            gate,
            shared,
            native_listener,
        }
    }

    /// Register a handler for the trigger described by `config`.
    ///
    /// Validates the selector field, resolves elements on first use of the
    /// (selector-set, event) key and attaches at most one native listener per
    /// (element, event-name) pair. Configuration and resolution errors are
    /// synchronous; nothing is deferred to the first firing.
    ///
    /// Returns a token that removes this specific handler later.
    pub fn add<F>(
        &self,
        context: Option<&ElementRef>,
        trigger_type: &str,
        config: &TriggerConfig,
        handler: F,
        use_capture: bool,
    ) -> Result<HandlerToken>
    where
        F: Fn(&AnalyticsEvent) + Send + Sync + 'static,
    {
        let mut guard = self.shared.state.lock();
        let state = guard.as_mut().ok_or(TrackerError::Disposed)?;

        let selectors = config.validated_selectors()?;
        let key = SubscriptionKey::new(config.on.clone(), selectors.clone());

        if !state.subscriptions.iter().any(|sub| sub.key == key) {
            let elements = if selectors.len() == 1 {
                vec![self.resolver.get_element(&selectors[0])?]
            } else {
                self.resolver.get_elements_by_query_selector_all(&selectors)?
            };

            for element in &elements {
                let binding_key = (element.id(), key.event.clone());
                if !state.native.contains_key(&binding_key) {
                    let handle = element.add_event_listener(
                        &key.event,
                        Arc::clone(&self.native_listener),
                        use_capture,
                    );
                    state.native.insert(
                        binding_key,
                        NativeBinding {
                            element: Arc::clone(element),
                            handle,
                        },
                    );
                }
            }

            trace!(
                trigger = trigger_type,
                event = %key.event,
                elements = elements.len(),
                context = context.map(|el| el.id().0),
                "resolved browser event subscription"
            );
            state.subscriptions.push(Subscription {
                key: key.clone(),
                elements,
            });
        }

        state
            .observables
            .add_handler(key, Arc::new(handler) as EventHandler, use_capture)
    }

    /// Remove one handler registration; no-op if already removed.
    pub fn remove_handler(&self, token: HandlerToken) -> Result<()> {
        let mut guard = self.shared.state.lock();
        let state = guard.as_mut().ok_or(TrackerError::Disposed)?;
        state.observables.remove_handler(token);
        Ok(())
    }

    /// Total handler registrations; `None` once disposed.
    pub fn handler_count(&self) -> Option<usize> {
        self.shared
            .state
            .lock()
            .as_ref()
            .map(|s| s.observables.handler_count())
    }

    /// Handler registrations under one key; `None` once disposed.
    pub fn handler_count_for(&self, key: &SubscriptionKey) -> Option<usize> {
        self.shared
            .state
            .lock()
            .as_ref()
            .map(|s| s.observables.handler_count_for(key))
    }

    /// Number of resolved subscriptions; `None` once disposed.
    pub fn subscription_count(&self) -> Option<usize> {
        self.shared
            .state
            .lock()
            .as_ref()
            .map(|s| s.subscriptions.len())
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().is_none()
    }

    /// Remove every native listener, clear the registry and cancel the gate.
    ///
    /// Callable at any time, including mid-debounce-window; a scheduled
    /// callback that fires after this returns finds no live state and
    /// touches nothing.
    pub fn dispose(&self) {
        let state = self.shared.state.lock().take();
        if let Some(mut state) = state {
            state.observables.dispose();
            let removed = state.native.len();
            for (_, binding) in state.native.drain() {
                binding.element.remove_event_listener(binding.handle);
            }
            debug!(listeners = removed, "disposed browser event tracker");
        }
        self.gate.cancel();
    }
}
