//! Wire messages exchanged with push-channel subscribers.
//!
//! Server → client messages are [`PushMessage`]s, encoded as
//! `{"type": "...", "data": ...}`. Client → server messages are
//! [`ClientMessage`]s in the same envelope.

use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;
use crate::id::AlarmId;
use crate::log_entry::LogEntry;
use crate::value::ValueReading;

/// A message pushed to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    /// Full state sent once, right after subscribing.
    InitialData(Snapshot),
    /// A single new log entry (protocol topic).
    NewEntry(LogEntry),
    /// Current value per device (dashboard topic).
    ValuesUpdate(Snapshot),
    /// Complete alarm list (alarm topic).
    AlarmUpdate(Snapshot),
}

impl PushMessage {
    /// Wire name of the message type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitialData(_) => "initial_data",
            Self::NewEntry(_) => "new_entry",
            Self::ValuesUpdate(_) => "values_update",
            Self::AlarmUpdate(_) => "alarm_update",
        }
    }
}

/// Complete current state for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    Entries { entries: Vec<LogEntry> },
    Values { values: Vec<ValueReading> },
    Alarms { alarms: Vec<Alarm> },
}

/// A message received from a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    AcknowledgeAlarm { alarm_id: AlarmId },
}
