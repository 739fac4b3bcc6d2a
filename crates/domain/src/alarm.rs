//! Alarm — a condition raised against a device, identified by
//! `(device_id, alarm_type)` rather than by its row id.
//!
//! Raising an alarm for an existing key overwrites the mutable fields of the
//! existing row. `acknowledged` only becomes `true` through an explicit
//! acknowledge addressed by row id.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{HomewatchError, ValidationError};
use crate::id::AlarmId;
use crate::time::{self, Timestamp};

/// Conventional priority levels (higher is more urgent).
pub mod priority {
    pub const LOW: i32 = 0;
    pub const MEDIUM: i32 = 1;
    pub const HIGH: i32 = 2;
    pub const CRITICAL: i32 = 3;
}

/// Payload of an `ALARM` event: the full mutable state for one alarm key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlarm {
    pub device_id: String,
    pub alarm_type: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(
        default = "time::now",
        deserialize_with = "time::deserialize_lenient"
    )]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: i32,
}

impl NewAlarm {
    /// Create a builder for constructing a [`NewAlarm`].
    #[must_use]
    pub fn builder() -> NewAlarmBuilder {
        NewAlarmBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomewatchError::Validation`] when `device_id` or
    /// `alarm_type` is empty.
    pub fn validate(&self) -> Result<(), HomewatchError> {
        if self.device_id.is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        if self.alarm_type.is_empty() {
            return Err(ValidationError::EmptyAlarmType.into());
        }
        Ok(())
    }

    /// Attach the store-assigned row id.
    #[must_use]
    pub fn into_alarm(self, id: AlarmId) -> Alarm {
        Alarm {
            id,
            device_id: self.device_id,
            alarm_type: self.alarm_type,
            active: self.active,
            acknowledged: self.acknowledged,
            timestamp: self.timestamp,
            message: self.message,
            priority: self.priority,
        }
    }
}

/// Step-by-step builder for [`NewAlarm`].
#[derive(Debug, Default)]
pub struct NewAlarmBuilder {
    device_id: Option<String>,
    alarm_type: Option<String>,
    active: bool,
    acknowledged: bool,
    timestamp: Option<Timestamp>,
    message: Option<String>,
    priority: i32,
}

impl NewAlarmBuilder {
    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn alarm_type(mut self, alarm_type: impl Into<String>) -> Self {
        self.alarm_type = Some(alarm_type.into());
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[must_use]
    pub fn acknowledged(mut self, acknowledged: bool) -> Self {
        self.acknowledged = acknowledged;
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Consume the builder, validate, and return a [`NewAlarm`].
    ///
    /// # Errors
    ///
    /// Returns [`HomewatchError::Validation`] if `device_id` or `alarm_type`
    /// is missing or empty.
    pub fn build(self) -> Result<NewAlarm, HomewatchError> {
        let alarm = NewAlarm {
            device_id: self.device_id.unwrap_or_default(),
            alarm_type: self.alarm_type.unwrap_or_default(),
            active: self.active,
            acknowledged: self.acknowledged,
            timestamp: self.timestamp.unwrap_or_else(time::now),
            message: self.message.unwrap_or_default(),
            priority: self.priority,
        };
        alarm.validate()?;
        Ok(alarm)
    }
}

/// A persisted alarm row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    pub device_id: String,
    pub alarm_type: String,
    pub active: bool,
    pub acknowledged: bool,
    pub timestamp: Timestamp,
    pub message: String,
    pub priority: i32,
}

impl Alarm {
    /// Whether this row carries the given identity key.
    #[must_use]
    pub fn has_key(&self, device_id: &str, alarm_type: &str) -> bool {
        self.device_id == device_id && self.alarm_type == alarm_type
    }

    /// Overwrite every mutable field from a fresh raise of the same key.
    pub fn overwrite_with(&mut self, raised: NewAlarm) {
        self.active = raised.active;
        self.acknowledged = raised.acknowledged;
        self.timestamp = raised.timestamp;
        self.message = raised.message;
        self.priority = raised.priority;
    }

    /// Snapshot order: priority descending, then timestamp descending.
    #[must_use]
    pub fn snapshot_order(a: &Self, b: &Self) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    }
}

/// Payload of an `ALARM_ACKNOWLEDGE` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmAcknowledge {
    pub alarm_id: AlarmId,
}
