use std::sync::Arc;

use async_trait::async_trait;

use homewatch_domain::error::HomewatchError;
use homewatch_domain::event::{Event, EventType};
use homewatch_domain::message::{PushMessage, Snapshot};
use homewatch_domain::topic::Topic;
use homewatch_domain::value::{ValueChanged, ValueReading};

use super::EventHandler;
use crate::broadcast_hub::BroadcastHub;
use crate::event_bus::EventSender;
use crate::ports::{Store, StoreTransaction};

/// Records `VALUE` readings, derives `VALUE_CHANGED`, and refreshes the
/// dashboard with the current value of every device.
pub struct ValueHandler<S> {
    store: S,
    hub: Arc<BroadcastHub>,
    events: EventSender,
}

impl<S: Store> ValueHandler<S> {
    pub fn new(store: S, hub: Arc<BroadcastHub>, events: EventSender) -> Self {
        Self { store, hub, events }
    }
}

#[async_trait]
impl<S: Store> EventHandler for ValueHandler<S> {
    fn name(&self) -> &'static str {
        "value"
    }

    fn event_types(&self) -> &'static [EventType] {
        &[EventType::Value]
    }

    #[tracing::instrument(skip_all, fields(handler = "value"))]
    async fn handle(&self, event: &Event) -> Result<(), HomewatchError> {
        let reading: ValueReading = event.parse_payload()?;
        reading.validate()?;

        let mut tx = self.store.begin().await?;
        let previous = tx.current_value(&reading.device_id).await?;
        let inserted = tx.insert_value(&reading).await?;
        tx.commit().await?;

        if !inserted {
            tracing::debug!(device_id = %reading.device_id, timestamp = %reading.timestamp, "duplicate reading kept as first written");
        }

        // Every VALUE derives exactly one VALUE_CHANGED, duplicates included.
        let changed = ValueChanged::new(&reading, previous.as_ref());
        // Bus pressure is logged by the sender; the reading itself is stored.
        let _ = self
            .events
            .enqueue(Event::from_payload(EventType::ValueChanged, &changed)?);

        let mut tx = self.store.begin().await?;
        let values = tx.current_values().await?;
        tx.commit().await?;

        self.hub
            .publish(
                Topic::Dashboard,
                PushMessage::ValuesUpdate(Snapshot::Values { values }),
            )
            .await;
        Ok(())
    }
}
