//! The seam between the tracker and the host's document.
//!
//! The tracker never queries or mutates a real DOM. The host supplies
//! element lookups through [`ElementResolver`] and listener plumbing through
//! [`Element`]; native occurrences come back as [`RawEvent`]s. Tests
//! implement both traits over an in-memory document.

use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Host-assigned identity for an element.
///
/// Two handles refer to the same element exactly when their ids are equal;
/// analytics-event equality relies on this.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by a listener attachment, used for removal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(pub u64);

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerHandle({})", self.0)
    }
}

/// A native event occurrence as reported by the host.
#[derive(Clone)]
pub struct RawEvent {
    /// Element the event fired on.
    pub target: ElementRef,
    /// Native event name (e.g. "change").
    pub event_type: String,
}

impl fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawEvent")
            .field("target", &self.target.id())
            .field("event_type", &self.event_type)
            .finish()
    }
}

/// Callback attached to an element as a native listener.
pub type NativeListener = Arc<dyn Fn(&RawEvent) + Send + Sync>;

/// A host-owned element the tracker can attach native listeners to.
pub trait Element: Send + Sync {
    /// Stable identity of this element within its document.
    fn id(&self) -> ElementId;

    /// Attach a native listener for `event`.
    fn add_event_listener(
        &self,
        event: &str,
        listener: NativeListener,
        use_capture: bool,
    ) -> ListenerHandle;

    /// Detach a previously attached listener. Unknown handles are a no-op.
    fn remove_event_listener(&self, handle: ListenerHandle);
}

/// Shared handle to a host element.
pub type ElementRef = Arc<dyn Element>;

/// Scoping collaborator resolving selectors against a document root.
pub trait ElementResolver: Send + Sync {
    /// Resolve a single selector to exactly one element.
    ///
    /// Fails with [`TrackerError::NoMatch`](crate::TrackerError::NoMatch) on
    /// zero matches and [`TrackerError::Ambiguous`](crate::TrackerError::Ambiguous)
    /// on more than one.
    fn get_element(&self, selector: &str) -> Result<ElementRef>;

    /// Resolve an ordered selector list, one element per selector, in input
    /// order.
    fn get_elements_by_query_selector_all(
        &self,
        selectors: &[String],
    ) -> Result<Vec<ElementRef>>;
}
