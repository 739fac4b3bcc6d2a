//! # homewatch-adapter-simulator
//!
//! Demo plugin that fakes a single temperature sensor.
//!
//! ## Behaviour
//!
//! On every `CYCLE` tick the plugin enqueues, in order:
//!
//! | Event | Content |
//! |-------|---------|
//! | `LOG` | `"Simulated log entry"`, protocol `SIM`, level `INFO` |
//! | `VALUE` | `simulated_device_1` temperature in `°C`, starting at 22.1 |
//! | `ALARM` | `TemperatureThreshold`, high priority, active |
//!
//! The temperature rises by 0.1 after each reading; the alarm message quotes
//! the raised value.
//!
//! ## Dependency rule
//!
//! Depends on `homewatch-app` (plugin contract, event bus) and
//! `homewatch-domain` only.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use homewatch_app::event_bus::EventSender;
use homewatch_app::plugin::Plugin;
use homewatch_domain::alarm::{NewAlarm, priority};
use homewatch_domain::error::HomewatchError;
use homewatch_domain::event::{Event, EventType};
use homewatch_domain::log_entry::{LogLevel, NewLogEntry};
use homewatch_domain::time;
use homewatch_domain::value::ValueReading;

/// Device id used for every simulated reading and alarm.
pub const DEVICE_ID: &str = "simulated_device_1";

const PROTOCOL: &str = "SIM";
const ALARM_TYPE: &str = "TemperatureThreshold";
const INITIAL_TENTHS: u32 = 221;

/// Plugin producing synthetic telemetry on each tick.
pub struct SimulatorPlugin {
    events: EventSender,
    /// Temperature in tenths of a degree, so the rendered value never drifts.
    tenths: AtomicU32,
}

impl SimulatorPlugin {
    #[must_use]
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            tenths: AtomicU32::new(INITIAL_TENTHS),
        }
    }

    fn log_event() -> Result<Event, HomewatchError> {
        let entry = NewLogEntry {
            timestamp: time::now(),
            message: "Simulated log entry".to_string(),
            protocol: PROTOCOL.to_string(),
            level: LogLevel::Info,
            ref_id: None,
        };
        Event::from_payload(EventType::Log, &entry)
    }

    fn value_event(tenths: u32) -> Result<Event, HomewatchError> {
        let reading = ValueReading {
            device_id: DEVICE_ID.to_string(),
            timestamp: time::now(),
            value_type: "temperature".to_string(),
            value: render(tenths),
            unit: Some("°C".to_string()),
        };
        Event::from_payload(EventType::Value, &reading)
    }

    fn alarm_event(tenths: u32) -> Result<Event, HomewatchError> {
        let alarm = NewAlarm::builder()
            .device_id(DEVICE_ID)
            .alarm_type(ALARM_TYPE)
            .active(true)
            .priority(priority::HIGH)
            .message(format!(
                "Simulated alarm: Temperature reached {}°C",
                render(tenths)
            ))
            .build()?;
        Event::from_payload(EventType::Alarm, &alarm)
    }
}

fn render(tenths: u32) -> String {
    format!("{}.{}", tenths / 10, tenths % 10)
}

#[async_trait]
impl Plugin for SimulatorPlugin {
    fn name(&self) -> &str {
        "simulator"
    }

    async fn trigger(&self, event: &Event) -> Result<(), HomewatchError> {
        if event.event_type != EventType::Cycle {
            return Ok(());
        }
        tracing::debug!(payload = %event.payload, "simulator triggered");

        let current = self.tenths.fetch_add(1, Ordering::Relaxed);

        self.events.enqueue(Self::log_event()?)?;
        self.events.enqueue(Self::value_event(current)?)?;
        self.events.enqueue(Self::alarm_event(current + 1)?)?;
        Ok(())
    }
}
