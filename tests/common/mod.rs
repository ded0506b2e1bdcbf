//! In-memory document shared by the integration tests.
//!
//! Implements the crate's DOM seam over plain maps: elements are registered
//! under their selector, native events are dispatched by hand the way the
//! host's event loop would.

#![allow(dead_code)]

use beacon::{
    AnalyticsEvent, Element, ElementId, ElementRef, ElementResolver, ListenerHandle,
    NativeListener, RawEvent, Result, TrackerError,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

struct Attached {
    handle: ListenerHandle,
    event: String,
    listener: NativeListener,
}

pub struct MockElement {
    id: ElementId,
    listeners: Mutex<Vec<Attached>>,
    next_handle: AtomicU64,
}

impl MockElement {
    fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id: ElementId(id),
            listeners: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(1),
        })
    }

    /// Native listeners currently attached, across all event names.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl Element for MockElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn add_event_listener(
        &self,
        event: &str,
        listener: NativeListener,
        _use_capture: bool,
    ) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push(Attached {
            handle,
            event: event.to_string(),
            listener,
        });
        handle
    }

    fn remove_event_listener(&self, handle: ListenerHandle) {
        self.listeners.lock().retain(|a| a.handle != handle);
    }
}

/// Dispatch a native event on `element`, as the host's event loop would.
pub fn dispatch(element: &Arc<MockElement>, event_type: &str) {
    let raw = RawEvent {
        target: Arc::clone(element) as ElementRef,
        event_type: event_type.to_string(),
    };
    let listeners: Vec<NativeListener> = element
        .listeners
        .lock()
        .iter()
        .filter(|a| a.event == event_type)
        .map(|a| Arc::clone(&a.listener))
        .collect();
    for listener in listeners {
        listener(&raw);
    }
}

/// Scoping root over an in-memory element table, with resolver call
/// counters for multiplexing assertions.
pub struct MockDocument {
    elements: Mutex<HashMap<String, Vec<Arc<MockElement>>>>,
    next_id: AtomicU64,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl MockDocument {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            elements: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            single_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        })
    }

    /// Register a new element under `selector`.
    pub fn create_element(&self, selector: &str) -> Arc<MockElement> {
        let element = MockElement::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.elements
            .lock()
            .entry(selector.to_string())
            .or_default()
            .push(Arc::clone(&element));
        element
    }

    /// Times `get_element` has been called.
    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    /// Times `get_elements_by_query_selector_all` has been called.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn lookup_one(&self, selector: &str) -> Result<ElementRef> {
        let elements = self.elements.lock();
        match elements.get(selector).map(Vec::as_slice) {
            None | Some([]) => Err(TrackerError::NoMatch(selector.to_string())),
            Some([element]) => Ok(Arc::clone(element) as ElementRef),
            Some(matched) => Err(TrackerError::Ambiguous {
                selector: selector.to_string(),
                count: matched.len(),
            }),
        }
    }
}

impl ElementResolver for MockDocument {
    fn get_element(&self, selector: &str) -> Result<ElementRef> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup_one(selector)
    }

    fn get_elements_by_query_selector_all(
        &self,
        selectors: &[String],
    ) -> Result<Vec<ElementRef>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        selectors.iter().map(|sel| self.lookup_one(sel)).collect()
    }
}

/// Records every analytics event a handler receives.
#[derive(Clone)]
pub struct Recorder {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A fresh handler closure feeding this recorder.
    pub fn handler(&self) -> impl Fn(&AnalyticsEvent) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |event: &AnalyticsEvent| events.lock().push(event.clone())
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }
}
