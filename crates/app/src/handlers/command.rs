use async_trait::async_trait;

use homewatch_domain::alarm::AlarmAcknowledge;
use homewatch_domain::error::HomewatchError;
use homewatch_domain::event::{CommandPayload, Event, EventType};

use super::EventHandler;
use crate::event_bus::EventSender;

/// `command_type` that acknowledges an alarm by id.
pub const ACKNOWLEDGE_ALARM: &str = "acknowledge_alarm";

/// Interprets `COMMAND` events and turns them into typed events on the bus.
pub struct CommandHandler {
    events: EventSender,
}

impl CommandHandler {
    #[must_use]
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

#[async_trait]
impl EventHandler for CommandHandler {
    fn name(&self) -> &'static str {
        "command"
    }

    fn event_types(&self) -> &'static [EventType] {
        &[EventType::Command]
    }

    #[tracing::instrument(skip_all, fields(handler = "command"))]
    async fn handle(&self, event: &Event) -> Result<(), HomewatchError> {
        let command: CommandPayload = event.parse_payload()?;
        match command.command_type.as_str() {
            ACKNOWLEDGE_ALARM => {
                let acknowledge: AlarmAcknowledge = event.parse_payload()?;
                self.events.enqueue(Event::from_payload(
                    EventType::AlarmAcknowledge,
                    &acknowledge,
                )?)?;
            }
            other => tracing::warn!(command_type = other, "unknown command ignored"),
        }
        Ok(())
    }
}
