//! Inbound ingestion — turning external input into bus events.
//!
//! Two entry points exist: text frames from push-channel subscribers and
//! raw events submitted over the REST surface. Both only ever enqueue.

use homewatch_domain::alarm::AlarmAcknowledge;
use homewatch_domain::error::{HomewatchError, ValidationError};
use homewatch_domain::event::{Event, EventType};
use homewatch_domain::message::ClientMessage;
use homewatch_domain::topic::Topic;

use crate::event_bus::EventSender;

/// Decode a subscriber's text frame into the event it requests.
///
/// Only the alarm topic accepts client messages. Anything else, and any
/// frame that does not decode, is logged and yields `None`.
#[must_use]
pub fn decode_client_message(topic: Topic, text: &str) -> Option<Event> {
    if topic != Topic::Alarm {
        tracing::debug!(%topic, "ignoring inbound frame on read-only topic");
        return None;
    }
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::AcknowledgeAlarm { alarm_id }) => {
            match Event::from_payload(EventType::AlarmAcknowledge, &AlarmAcknowledge { alarm_id }) {
                Ok(event) => Some(event),
                Err(err) => {
                    tracing::warn!(error = ?err, "could not encode acknowledge event");
                    None
                }
            }
        }
        Err(err) => {
            tracing::warn!(%topic, %err, "malformed client message ignored");
            None
        }
    }
}

/// Enqueue an externally submitted event.
///
/// # Errors
///
/// Returns [`ValidationError::NotInjectable`] for lifecycle, tick and
/// derived event types, and [`HomewatchError::Bus`] when the bus refuses
/// the event.
pub fn inject(events: &EventSender, event: Event) -> Result<(), HomewatchError> {
    if !event.event_type.is_injectable() {
        return Err(ValidationError::NotInjectable(event.event_type).into());
    }
    let event_type = event.event_type;
    events.enqueue(event)?;
    tracing::debug!(%event_type, "external event enqueued");
    Ok(())
}
