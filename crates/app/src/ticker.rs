//! Periodic ticker — the independent producer of `CYCLE` events.
//!
//! The ticker only enqueues; it never touches the store or the hub.

use std::time::Duration;

use homewatch_domain::event::{Event, EventType};
use homewatch_domain::time;

use crate::event_bus::EventSender;
use crate::shutdown::Shutdown;

/// Default tick interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Emits one `CYCLE` per interval until shutdown.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    events: EventSender,
}

impl Ticker {
    /// A ticker firing every `interval` (at least one second).
    #[must_use]
    pub fn new(interval: Duration, events: EventSender) -> Self {
        Self {
            interval: interval.max(Duration::from_secs(1)),
            events,
        }
    }

    /// Label carried in the payload, e.g. `"60_seconds"`.
    #[must_use]
    pub fn kind(&self) -> String {
        format!("{}_seconds", self.interval.as_secs())
    }

    /// Build the next `CYCLE` event.
    #[must_use]
    pub fn cycle(&self) -> Event {
        Event::new(
            EventType::Cycle,
            serde_json::json!({
                "kind": self.kind(),
                "timestamp": time::format(time::now()),
            }),
        )
    }

    /// Tick immediately, then once per interval, until `shutdown` fires.
    pub async fn run(self, mut shutdown: Shutdown) {
        tracing::info!(interval = ?self.interval, "ticker started");
        let mut ticks = tokio::time::interval(self.interval);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.wait() => break,
                _ = ticks.tick() => {
                    // A full bus is already logged by the sender.
                    let _ = self.events.enqueue(self.cycle());
                }
            }
        }
        tracing::info!("ticker stopped");
    }
}
