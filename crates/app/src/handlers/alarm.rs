use std::sync::Arc;

use async_trait::async_trait;

use homewatch_domain::alarm::{AlarmAcknowledge, NewAlarm};
use homewatch_domain::error::HomewatchError;
use homewatch_domain::event::{Event, EventType};
use homewatch_domain::message::{PushMessage, Snapshot};
use homewatch_domain::topic::Topic;

use super::EventHandler;
use crate::broadcast_hub::BroadcastHub;
use crate::ports::{Store, StoreTransaction};

/// Maximum number of alarms pushed in one `alarm_update`.
pub const ALARM_LIST_LIMIT: usize = 100;

/// Upserts raised alarms, applies acknowledgements, and pushes the full
/// alarm list after every change.
pub struct AlarmHandler<S> {
    store: S,
    hub: Arc<BroadcastHub>,
}

impl<S: Store> AlarmHandler<S> {
    pub fn new(store: S, hub: Arc<BroadcastHub>) -> Self {
        Self { store, hub }
    }

    async fn raise(&self, event: &Event) -> Result<bool, HomewatchError> {
        let alarm: NewAlarm = event.parse_payload()?;
        alarm.validate()?;

        let mut tx = self.store.begin().await?;
        let alarm = tx.upsert_alarm(alarm).await?;
        tx.commit().await?;

        tracing::debug!(
            id = %alarm.id,
            device_id = %alarm.device_id,
            alarm_type = %alarm.alarm_type,
            active = alarm.active,
            "alarm upserted"
        );
        Ok(true)
    }

    async fn acknowledge(&self, event: &Event) -> Result<bool, HomewatchError> {
        let AlarmAcknowledge { alarm_id } = event.parse_payload()?;

        let mut tx = self.store.begin().await?;
        let found = tx.acknowledge_alarm(alarm_id).await?;
        tx.commit().await?;

        if found {
            tracing::info!(%alarm_id, "alarm acknowledged");
        } else {
            tracing::warn!(%alarm_id, "acknowledge for unknown alarm ignored");
        }
        Ok(found)
    }

    async fn push_alarm_list(&self) -> Result<(), HomewatchError> {
        let mut tx = self.store.begin().await?;
        let alarms = tx.alarms(ALARM_LIST_LIMIT).await?;
        tx.commit().await?;

        self.hub
            .publish(
                Topic::Alarm,
                PushMessage::AlarmUpdate(Snapshot::Alarms { alarms }),
            )
            .await;
        Ok(())
    }
}

#[async_trait]
impl<S: Store> EventHandler for AlarmHandler<S> {
    fn name(&self) -> &'static str {
        "alarm"
    }

    fn event_types(&self) -> &'static [EventType] {
        &[EventType::Alarm, EventType::AlarmAcknowledge]
    }

    #[tracing::instrument(skip_all, fields(handler = "alarm", event_type = %event.event_type))]
    async fn handle(&self, event: &Event) -> Result<(), HomewatchError> {
        let changed = match event.event_type {
            EventType::Alarm => self.raise(event).await?,
            EventType::AlarmAcknowledge => self.acknowledge(event).await?,
            _ => false,
        };
        if changed {
            self.push_alarm_list().await?;
        }
        Ok(())
    }
}
