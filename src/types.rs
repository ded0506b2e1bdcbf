//! Core types for the event bridge.

use crate::dom::ElementRef;
use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque token identifying one handler registration.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerToken(pub u64);

impl fmt::Debug for HandlerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerToken({})", self.0)
    }
}

/// A context variable attached to an analytics event.
///
/// The tracker itself always emits an empty variable map; outer widget
/// layers inject these when they have state worth reporting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Str(String),
    Num(f64),
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        VarValue::Str(s.to_string())
    }
}

impl From<String> for VarValue {
    fn from(s: String) -> Self {
        VarValue::Str(s)
    }
}

impl From<f64> for VarValue {
    fn from(n: f64) -> Self {
        VarValue::Num(n)
    }
}

/// A normalized analytics event produced by the tracker.
///
/// Immutable after construction. Equality is structural: target identity
/// plus event type plus variables, so tests can assert exact firings.
#[derive(Clone)]
pub struct AnalyticsEvent {
    target: ElementRef,
    event_type: String,
    vars: HashMap<String, VarValue>,
}

impl AnalyticsEvent {
    /// Create an event with no variables.
    pub fn new(target: ElementRef, event_type: impl Into<String>) -> Self {
        Self {
            target,
            event_type: event_type.into(),
            vars: HashMap::new(),
        }
    }

    /// Create an event carrying widget-injected variables.
    pub fn with_vars(
        target: ElementRef,
        event_type: impl Into<String>,
        vars: HashMap<String, VarValue>,
    ) -> Self {
        Self {
            target,
            event_type: event_type.into(),
            vars,
        }
    }

    /// The element on which the native event fired.
    pub fn target(&self) -> &ElementRef {
        &self.target
    }

    /// String event discriminator (e.g. "change", "blur").
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Extracted variables, normally empty.
    pub fn vars(&self) -> &HashMap<String, VarValue> {
        &self.vars
    }
}

impl PartialEq for AnalyticsEvent {
    fn eq(&self, other: &Self) -> bool {
        self.target.id() == other.target.id()
            && self.event_type == other.event_type
            && self.vars == other.vars
    }
}

impl fmt::Debug for AnalyticsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsEvent")
            .field("target", &self.target.id())
            .field("event_type", &self.event_type)
            .field("vars", &self.vars)
            .finish()
    }
}

/// Selector field of a trigger config: a single selector or an ordered list.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Selector {
    Single(String),
    Multiple(Vec<String>),
}

/// Configuration for one browser event trigger.
///
/// Deserialized from the host's JSON trigger config; keys other than `on`
/// and `selector` belong to outer widget logic and are ignored here.
#[derive(Clone, Debug, Deserialize)]
pub struct TriggerConfig {
    /// Native event name to listen for.
    pub on: String,

    /// Element selector(s); required, enforced at `add()` time.
    #[serde(default)]
    pub selector: Option<Selector>,
}

impl TriggerConfig {
    /// Config with a single selector.
    pub fn single(on: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            on: on.into(),
            selector: Some(Selector::Single(selector.into())),
        }
    }

    /// Config with an ordered selector list.
    pub fn multi(on: impl Into<String>, selectors: Vec<String>) -> Self {
        Self {
            on: on.into(),
            selector: Some(Selector::Multiple(selectors)),
        }
    }

    /// Validate and normalize the selector field to an ordered list.
    ///
    /// Checks run before any DOM interaction: the selector must be present
    /// and non-empty, and a selector list must contain no duplicates
    /// (compared after trimming; the error message reports the originals).
    pub fn validated_selectors(&self) -> Result<Vec<String>> {
        let selector = self.selector.as_ref().ok_or(TrackerError::MissingSelector)?;

        match selector {
            Selector::Single(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(TrackerError::MissingSelector);
                }
                Ok(vec![trimmed.to_string()])
            }
            Selector::Multiple(list) => {
                if list.is_empty() {
                    return Err(TrackerError::MissingSelector);
                }
                let normalized: Vec<String> =
                    list.iter().map(|s| s.trim().to_string()).collect();
                for (i, sel) in normalized.iter().enumerate() {
                    if normalized[..i].contains(sel) {
                        return Err(TrackerError::DuplicateSelectors(list.join(",")));
                    }
                }
                Ok(normalized)
            }
        }
    }
}

/// Composite identity multiplexing handlers onto shared native listeners.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    /// Native event name.
    pub event: String,
    /// Normalized, order-preserving selector list.
    pub selectors: Vec<String>,
}

impl SubscriptionKey {
    pub fn new(event: impl Into<String>, selectors: Vec<String>) -> Self {
        Self {
            event: event.into(),
            selectors,
        }
    }
}

impl fmt::Debug for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionKey({} on {})", self.selectors.join(","), self.event)
    }
}
