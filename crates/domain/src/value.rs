//! Value reading — a single sensor sample keyed by `(device_id, timestamp)`.
//!
//! Readings are immutable: writing the same key twice keeps the first one.
//! The "current value" of a device is its reading with the greatest
//! timestamp.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{HomewatchError, ValidationError};
use crate::time::{self, Timestamp};

/// A persisted (or about to be persisted) sensor reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueReading {
    #[serde(alias = "id")]
    pub device_id: String,
    #[serde(
        default = "time::now",
        deserialize_with = "time::deserialize_lenient"
    )]
    pub timestamp: Timestamp,
    /// Kind of measurement, e.g. `"temperature"`.
    pub value_type: String,
    #[serde(deserialize_with = "deserialize_value_text")]
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ValueReading {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomewatchError::Validation`] when `device_id` or
    /// `value_type` is empty.
    pub fn validate(&self) -> Result<(), HomewatchError> {
        if self.device_id.is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        if self.value_type.is_empty() {
            return Err(ValidationError::EmptyValueType.into());
        }
        Ok(())
    }

    /// The reading without its device id, as carried in `VALUE_CHANGED`.
    #[must_use]
    pub fn sample(&self) -> ValueSample {
        ValueSample {
            timestamp: self.timestamp,
            value_type: self.value_type.clone(),
            value: self.value.clone(),
            unit: self.unit.clone(),
        }
    }
}

/// A reading stripped of its device id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSample {
    pub timestamp: Timestamp,
    pub value_type: String,
    pub value: String,
    pub unit: Option<String>,
}

/// Payload of a `VALUE_CHANGED` event: the new sample first, then the
/// previous one if the device had a reading before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChanged {
    pub device_id: String,
    pub values: Vec<ValueSample>,
}

impl ValueChanged {
    #[must_use]
    pub fn new(current: &ValueReading, previous: Option<&ValueReading>) -> Self {
        let mut values = vec![current.sample()];
        values.extend(previous.map(ValueReading::sample));
        Self {
            device_id: current.device_id.clone(),
            values,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&ValueSample> {
        self.values.first()
    }

    #[must_use]
    pub fn previous(&self) -> Option<&ValueSample> {
        self.values.get(1)
    }
}

/// Accept strings, numbers and booleans for `value`, storing them as text.
fn deserialize_value_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        serde_json::Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar value, got {other}"
        ))),
    }
}
