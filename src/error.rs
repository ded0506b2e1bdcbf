//! Error types for the event bridge.

use thiserror::Error;

/// Main error type for tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Missing required selector on browser event trigger")]
    MissingSelector,

    #[error("Cannot have duplicate selectors in selectors list: {0}")]
    DuplicateSelectors(String),

    #[error("Tracker has been disposed")]
    Disposed,

    #[error("No element found for selector: {0}")]
    NoMatch(String),

    #[error("Selector matched {count} elements, expected exactly one: {selector}")]
    Ambiguous { selector: String, count: usize },
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
