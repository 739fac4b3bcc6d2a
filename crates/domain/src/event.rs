//! Event — an immutable, typed message travelling on the event bus.
//!
//! Events are produced by the ticker, by plugins, by handlers (derived
//! events) and by inbound client commands. The payload is an opaque JSON
//! object whose shape is defined per [`EventType`]; consumers decode it with
//! [`Event::parse_payload`].

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::HomewatchError;
use crate::time::Timestamp;

/// Closed set of event kinds understood by the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Start,
    Stop,
    Cycle,
    Command,
    Log,
    Value,
    ValueChanged,
    Alarm,
    AlarmAcknowledge,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Start,
        Self::Stop,
        Self::Cycle,
        Self::Command,
        Self::Log,
        Self::Value,
        Self::ValueChanged,
        Self::Alarm,
        Self::AlarmAcknowledge,
    ];

    /// Wire name of the event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Cycle => "CYCLE",
            Self::Command => "COMMAND",
            Self::Log => "LOG",
            Self::Value => "VALUE",
            Self::ValueChanged => "VALUE_CHANGED",
            Self::Alarm => "ALARM",
            Self::AlarmAcknowledge => "ALARM_ACKNOWLEDGE",
        }
    }

    /// Whether external sources (HTTP, client sockets) may enqueue this type.
    ///
    /// Lifecycle, tick and derived events are produced internally only.
    #[must_use]
    pub fn is_injectable(self) -> bool {
        matches!(
            self,
            Self::Command | Self::Log | Self::Value | Self::Alarm | Self::AlarmAcknowledge
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed event with its JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default = "empty_payload")]
    pub payload: serde_json::Value,
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Event {
    /// Create an event from a raw JSON payload.
    #[must_use]
    pub fn new(event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// Create an event with an empty payload object.
    #[must_use]
    pub fn empty(event_type: EventType) -> Self {
        Self::new(event_type, empty_payload())
    }

    /// Create an event by serializing a typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`HomewatchError::InvalidPayload`] if the payload cannot be
    /// represented as JSON.
    pub fn from_payload<T: Serialize>(
        event_type: EventType,
        payload: &T,
    ) -> Result<Self, HomewatchError> {
        serde_json::to_value(payload)
            .map(|payload| Self::new(event_type, payload))
            .map_err(|source| HomewatchError::InvalidPayload { event_type, source })
    }

    /// Decode the payload into its typed form.
    ///
    /// # Errors
    ///
    /// Returns [`HomewatchError::InvalidPayload`] if the payload does not
    /// match `T`.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, HomewatchError> {
        T::deserialize(&self.payload).map_err(|source| HomewatchError::InvalidPayload {
            event_type: self.event_type,
            source,
        })
    }
}

/// Payload of a [`EventType::Cycle`] tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePayload {
    /// Interval label, e.g. `"60_seconds"`.
    pub kind: String,
    pub timestamp: Timestamp,
}

/// Payload of a [`EventType::Command`] event.
///
/// `command_type` discriminates; remaining fields are command arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub command_type: String,
    #[serde(flatten)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}
