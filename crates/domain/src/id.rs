//! Typed identifier newtypes.
//!
//! Persisted rows are identified by store-assigned integers; live
//! subscribers are identified by random UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_row_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw row id.
            #[must_use]
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Access the raw row id.
            #[must_use]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

define_row_id!(
    /// Store-assigned identifier of a [`LogEntry`](crate::log_entry::LogEntry).
    LogEntryId
);

define_row_id!(
    /// Store-assigned identifier of an [`Alarm`](crate::alarm::Alarm) row.
    AlarmId
);

/// Identifier of a live push-channel subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(uuid::Uuid);

impl Default for SubscriberId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl SubscriberId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
