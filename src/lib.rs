//! # Beacon
//!
//! A selector-driven bridge from native browser events to analytics events.
//!
//! ## Core Concepts
//!
//! - **Tracker**: validates trigger configs, resolves selectors once per
//!   (selector-set, event) key and multiplexes handlers onto a minimal set
//!   of native listeners
//! - **Registry**: ordered handler table with token-based removal
//! - **Session gate**: injectable trailing-edge debounce between native
//!   firings and dispatch
//! - **DOM seam**: element lookup and listener plumbing stay behind traits;
//!   the host owns the document
//!
//! ## Example
//!
//! ```ignore
//! use beacon::{BrowserEventTracker, TriggerConfig};
//!
//! let tracker = BrowserEventTracker::new(resolver);
//!
//! let config: TriggerConfig = serde_json::from_value(json!({
//!     "on": "change",
//!     "selector": "#inputField",
//! }))?;
//!
//! let token = tracker.add(None, "browser-event", &config, |event| {
//!     println!("{} on {}", event.event_type(), event.target().id());
//! }, false)?;
//!
//! // ... later
//! tracker.dispose();
//! ```

pub mod dom;
pub mod error;
pub mod gate;
pub mod registry;
pub mod tracker;
pub mod types;

// Re-exports
pub use dom::{Element, ElementId, ElementRef, ElementResolver, ListenerHandle, NativeListener, RawEvent};
pub use error::{Result, TrackerError};
pub use gate::{DebounceGate, Deliver, PassthroughGate, SessionGate, SESSION_DEBOUNCE_MS};
pub use registry::{EventHandler, ObservableRegistry};
pub use tracker::BrowserEventTracker;
pub use types::{AnalyticsEvent, HandlerToken, Selector, SubscriptionKey, TriggerConfig, VarValue};
