use std::sync::Arc;

use async_trait::async_trait;

use homewatch_domain::error::HomewatchError;
use homewatch_domain::event::{Event, EventType};
use homewatch_domain::log_entry::NewLogEntry;
use homewatch_domain::message::PushMessage;
use homewatch_domain::topic::Topic;

use super::EventHandler;
use crate::broadcast_hub::BroadcastHub;
use crate::ports::{Store, StoreTransaction};

/// Appends `LOG` events to the store and streams each new entry to the
/// protocol topic.
pub struct LogHandler<S> {
    store: S,
    hub: Arc<BroadcastHub>,
}

impl<S: Store> LogHandler<S> {
    pub fn new(store: S, hub: Arc<BroadcastHub>) -> Self {
        Self { store, hub }
    }
}

#[async_trait]
impl<S: Store> EventHandler for LogHandler<S> {
    fn name(&self) -> &'static str {
        "log"
    }

    fn event_types(&self) -> &'static [EventType] {
        &[EventType::Log]
    }

    #[tracing::instrument(skip_all, fields(handler = "log"))]
    async fn handle(&self, event: &Event) -> Result<(), HomewatchError> {
        let entry: NewLogEntry = event.parse_payload()?;

        let mut tx = self.store.begin().await?;
        let entry = tx.append_log(entry).await?;
        tx.commit().await?;

        tracing::debug!(id = %entry.id, protocol = %entry.protocol, "log entry stored");
        self.hub
            .publish(Topic::Protocol, PushMessage::NewEntry(entry))
            .await;
        Ok(())
    }
}
