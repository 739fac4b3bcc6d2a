//! Topic — a named broadcast channel with its own subscriber pool.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three independent push topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Current value per device.
    Dashboard,
    /// Log entries.
    Protocol,
    /// Alarm list.
    Alarm,
}

impl Topic {
    pub const ALL: [Self; 3] = [Self::Dashboard, Self::Protocol, Self::Alarm];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Protocol => "protocol",
            Self::Alarm => "alarm",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
