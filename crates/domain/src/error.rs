//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HomewatchError`] via `From`, so the dispatch loop can log any failure
//! uniformly without string-typed variants.

use crate::event::EventType;

/// Top-level error shared by every layer.
#[derive(Debug, thiserror::Error)]
pub enum HomewatchError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// An event payload could not be decoded into its typed form.
    #[error("invalid payload for {event_type} event")]
    InvalidPayload {
        event_type: EventType,
        #[source]
        source: serde_json::Error,
    },

    /// The event bus refused an event.
    #[error("event bus error")]
    Bus(#[from] BusError),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A plugin reported a failure.
    #[error("plugin {plugin} failed: {message}")]
    Plugin { plugin: String, message: String },
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("alarm type must not be empty")]
    EmptyAlarmType,

    #[error("value type must not be empty")]
    EmptyValueType,

    #[error("event type {0} cannot be injected from outside")]
    NotInjectable(EventType),
}

/// Reasons an enqueue on the event bus can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// The bus is at capacity; the event was dropped.
    #[error("event bus is full")]
    Full,

    /// The consumer side has gone away.
    #[error("event bus is closed")]
    Closed,
}
