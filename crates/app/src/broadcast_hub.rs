//! Broadcast hub — per-topic subscriber pools with snapshot-on-join.
//!
//! Each subscriber is a bounded outbound channel drained by its
//! connection's writer task. Delivery is a non-blocking `try_send`, so a
//! slow or dead connection never stalls the dispatch loop: a closed or
//! full channel counts as an implicit disconnect and the subscriber is
//! pruned once the publish pass completes.
//!
//! Pools are guarded independently; publishing to one topic never contends
//! with subscribe/unsubscribe traffic on another.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use homewatch_domain::error::HomewatchError;
use homewatch_domain::id::SubscriberId;
use homewatch_domain::message::PushMessage;
use homewatch_domain::topic::Topic;

use crate::ports::SnapshotSource;

/// Default per-subscriber outbound buffer.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

type Outbox = mpsc::Sender<Arc<PushMessage>>;

/// Receiving end of a subscription, owned by the connection task.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub topic: Topic,
    receiver: mpsc::Receiver<Arc<PushMessage>>,
}

impl Subscription {
    /// Wait for the next message. `None` once the hub has dropped this
    /// subscriber and every buffered message has been read.
    pub async fn recv(&mut self) -> Option<Arc<PushMessage>> {
        self.receiver.recv().await
    }

    /// Take a buffered message without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<PushMessage>> {
        self.receiver.try_recv().ok()
    }
}

#[derive(Default)]
struct Pool {
    members: Mutex<Vec<(SubscriberId, Outbox)>>,
}

/// Fans out snapshots and deltas to live subscribers, one pool per topic.
pub struct BroadcastHub {
    dashboard: Pool,
    protocol: Pool,
    alarm: Pool,
    snapshots: Arc<dyn SnapshotSource>,
    buffer: usize,
}

impl BroadcastHub {
    /// Create a hub reading initial snapshots from `snapshots`.
    #[must_use]
    pub fn new(snapshots: Arc<dyn SnapshotSource>) -> Self {
        Self::with_buffer(snapshots, DEFAULT_SUBSCRIBER_BUFFER)
    }

    /// Create a hub with a custom per-subscriber buffer size.
    #[must_use]
    pub fn with_buffer(snapshots: Arc<dyn SnapshotSource>, buffer: usize) -> Self {
        Self {
            dashboard: Pool::default(),
            protocol: Pool::default(),
            alarm: Pool::default(),
            snapshots,
            buffer: buffer.max(1),
        }
    }

    fn pool(&self, topic: Topic) -> &Pool {
        match topic {
            Topic::Dashboard => &self.dashboard,
            Topic::Protocol => &self.protocol,
            Topic::Alarm => &self.alarm,
        }
    }

    /// Join `topic` and receive its full current state as the first message.
    ///
    /// The pool stays locked while the snapshot is read, so no publish can
    /// slip in between the snapshot and the subscriber joining.
    ///
    /// # Errors
    ///
    /// Returns the snapshot source's error; the subscriber is not added.
    #[tracing::instrument(skip(self))]
    pub async fn subscribe(&self, topic: Topic) -> Result<Subscription, HomewatchError> {
        let (outbox, receiver) = mpsc::channel(self.buffer);
        let id = SubscriberId::new();

        let mut members = self.pool(topic).members.lock().await;
        let snapshot = self.snapshots.snapshot(topic).await?;
        // Fresh channel with capacity >= 1: the first send cannot be refused.
        let _ = outbox.try_send(Arc::new(PushMessage::InitialData(snapshot)));
        members.push((id, outbox));

        tracing::info!(%topic, subscriber = %id, total = members.len(), "subscriber joined");
        Ok(Subscription {
            id,
            topic,
            receiver,
        })
    }

    /// Leave `topic`. Returns `false` if `id` was not (or no longer) a member.
    pub async fn unsubscribe(&self, topic: Topic, id: SubscriberId) -> bool {
        let mut members = self.pool(topic).members.lock().await;
        let before = members.len();
        members.retain(|(member, _)| *member != id);
        let removed = members.len() != before;
        if removed {
            tracing::info!(%topic, subscriber = %id, remaining = members.len(), "subscriber left");
        }
        removed
    }

    /// Deliver `message` to every subscriber of `topic`.
    ///
    /// Returns the number of successful deliveries. Subscribers whose
    /// delivery failed are removed after the full pass.
    pub async fn publish(&self, topic: Topic, message: PushMessage) -> usize {
        let mut members = self.pool(topic).members.lock().await;
        if members.is_empty() {
            return 0;
        }

        let kind = message.kind();
        let message = Arc::new(message);
        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, outbox) in members.iter() {
            match outbox.try_send(Arc::clone(&message)) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::debug!(%topic, subscriber = %id, %err, "delivery failed, pruning subscriber");
                    failed.push(*id);
                }
            }
        }

        if !failed.is_empty() {
            members.retain(|(id, _)| !failed.contains(id));
            tracing::info!(%topic, pruned = failed.len(), remaining = members.len(), "pruned failed subscribers");
        }
        tracing::debug!(%topic, kind, delivered, "published");
        delivered
    }

    /// Current size of the pool for `topic`.
    pub async fn subscriber_count(&self, topic: Topic) -> usize {
        self.pool(topic).members.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus;
    use crate::handlers::{AlarmHandler, EventHandler, LogHandler, ValueHandler};
    use crate::snapshots::StoreSnapshots;
    use crate::testing::{FailingSnapshots, InMemoryStore, StaticSnapshots};
    use homewatch_domain::event::{Event, EventType};
    use homewatch_domain::message::Snapshot;

    fn hub() -> BroadcastHub {
        BroadcastHub::with_buffer(Arc::new(StaticSnapshots), 4)
    }

    fn alarm_update() -> PushMessage {
        PushMessage::AlarmUpdate(Snapshot::Alarms { alarms: vec![] })
    }

    #[tokio::test]
    async fn should_send_initial_snapshot_first_when_subscribing() {
        let hub = hub();
        let mut sub = hub.subscribe(Topic::Protocol).await.unwrap();

        let first = sub.try_recv().unwrap();
        assert_eq!(
            *first,
            PushMessage::InitialData(Snapshot::Entries { entries: vec![] })
        );
        assert_eq!(hub.subscriber_count(Topic::Protocol).await, 1);
    }

    #[tokio::test]
    async fn should_not_add_subscriber_when_snapshot_fails() {
        let hub = BroadcastHub::new(Arc::new(FailingSnapshots));
        let result = hub.subscribe(Topic::Alarm).await;
        assert!(result.is_err());
        assert_eq!(hub.subscriber_count(Topic::Alarm).await, 0);
    }

    #[tokio::test]
    async fn should_deliver_to_every_subscriber_of_topic_only() {
        let hub = hub();
        let mut a = hub.subscribe(Topic::Alarm).await.unwrap();
        let mut b = hub.subscribe(Topic::Alarm).await.unwrap();
        let mut other = hub.subscribe(Topic::Dashboard).await.unwrap();
        a.try_recv();
        b.try_recv();
        other.try_recv();

        let delivered = hub.publish(Topic::Alarm, alarm_update()).await;

        assert_eq!(delivered, 2);
        assert_eq!(*a.try_recv().unwrap(), alarm_update());
        assert_eq!(*b.try_recv().unwrap(), alarm_update());
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn should_be_noop_when_publishing_to_empty_pool() {
        let hub = hub();
        assert_eq!(hub.publish(Topic::Dashboard, alarm_update()).await, 0);
    }

    #[tokio::test]
    async fn should_prune_disconnected_subscriber_and_keep_others() {
        let hub = hub();
        let dead = hub.subscribe(Topic::Alarm).await.unwrap();
        let mut alive = hub.subscribe(Topic::Alarm).await.unwrap();
        alive.try_recv();
        drop(dead);

        let delivered = hub.publish(Topic::Alarm, alarm_update()).await;

        assert_eq!(delivered, 1);
        assert!(alive.try_recv().is_some());
        assert_eq!(hub.subscriber_count(Topic::Alarm).await, 1);
    }

    #[tokio::test]
    async fn should_prune_subscriber_whose_buffer_is_full() {
        let hub = hub();
        let mut slow = hub.subscribe(Topic::Alarm).await.unwrap();
        // initial snapshot + 3 updates fill the buffer of 4
        for _ in 0..3 {
            hub.publish(Topic::Alarm, alarm_update()).await;
        }
        assert_eq!(hub.publish(Topic::Alarm, alarm_update()).await, 0);
        assert_eq!(hub.subscriber_count(Topic::Alarm).await, 0);

        let mut drained = 0;
        while slow.recv().await.is_some() {
            drained += 1;
        }
        assert_eq!(drained, 4);
    }

    #[tokio::test]
    async fn should_treat_second_unsubscribe_as_noop() {
        let hub = hub();
        let sub = hub.subscribe(Topic::Dashboard).await.unwrap();

        assert!(hub.unsubscribe(Topic::Dashboard, sub.id).await);
        assert!(!hub.unsubscribe(Topic::Dashboard, sub.id).await);
        assert_eq!(hub.subscriber_count(Topic::Dashboard).await, 0);
    }

    #[tokio::test]
    async fn should_ignore_unsubscribe_on_wrong_topic() {
        let hub = hub();
        let sub = hub.subscribe(Topic::Dashboard).await.unwrap();
        assert!(!hub.unsubscribe(Topic::Alarm, sub.id).await);
        assert_eq!(hub.subscriber_count(Topic::Dashboard).await, 1);
    }

    /// Feed one event of each persisted kind through the real handlers.
    async fn seed_through_handlers(store: &InMemoryStore, hub: &Arc<BroadcastHub>) {
        let (events, _receiver) = event_bus::channel(16);
        LogHandler::new(store.clone(), Arc::clone(hub))
            .handle(&Event::new(
                EventType::Log,
                serde_json::json!({"message": "door opened", "protocol": "MEROSS"}),
            ))
            .await
            .unwrap();
        let values = ValueHandler::new(store.clone(), Arc::clone(hub), events);
        for (value, timestamp) in [
            ("21.5", "2024-01-01T12:00:00Z"),
            ("22.0", "2024-01-01T12:01:00Z"),
        ] {
            values
                .handle(&Event::new(
                    EventType::Value,
                    serde_json::json!({
                        "device_id": "sensor_1",
                        "value_type": "temperature",
                        "value": value,
                        "timestamp": timestamp,
                    }),
                ))
                .await
                .unwrap();
        }
        AlarmHandler::new(store.clone(), Arc::clone(hub))
            .handle(&Event::new(
                EventType::Alarm,
                serde_json::json!({"device_id": "boiler", "alarm_type": "Overheat", "priority": 3}),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_send_current_state_as_initial_data_to_late_subscriber() {
        let store = InMemoryStore::new();
        let hub = Arc::new(BroadcastHub::new(Arc::new(StoreSnapshots::new(
            store.clone(),
        ))));
        seed_through_handlers(&store, &hub).await;

        let mut protocol = hub.subscribe(Topic::Protocol).await.unwrap();
        let PushMessage::InitialData(Snapshot::Entries { entries }) =
            protocol.try_recv().unwrap().as_ref().clone()
        else {
            panic!("expected protocol initial_data");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "door opened");

        let mut dashboard = hub.subscribe(Topic::Dashboard).await.unwrap();
        let PushMessage::InitialData(Snapshot::Values { values }) =
            dashboard.try_recv().unwrap().as_ref().clone()
        else {
            panic!("expected dashboard initial_data");
        };
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].device_id, "sensor_1");
        assert_eq!(values[0].value, "22.0");

        let mut alarm = hub.subscribe(Topic::Alarm).await.unwrap();
        let PushMessage::InitialData(Snapshot::Alarms { alarms }) =
            alarm.try_recv().unwrap().as_ref().clone()
        else {
            panic!("expected alarm initial_data");
        };
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].alarm_type, "Overheat");
        assert!(!alarms[0].acknowledged);
    }

    #[tokio::test]
    async fn should_reflect_acknowledgement_in_initial_data_of_later_subscriber() {
        let store = InMemoryStore::new();
        let hub = Arc::new(BroadcastHub::new(Arc::new(StoreSnapshots::new(
            store.clone(),
        ))));
        seed_through_handlers(&store, &hub).await;
        let id = store.alarms()[0].id;
        AlarmHandler::new(store.clone(), Arc::clone(&hub))
            .handle(&Event::new(
                EventType::AlarmAcknowledge,
                serde_json::json!({"alarm_id": id.get()}),
            ))
            .await
            .unwrap();

        let mut alarm = hub.subscribe(Topic::Alarm).await.unwrap();
        let PushMessage::InitialData(Snapshot::Alarms { alarms }) =
            alarm.try_recv().unwrap().as_ref().clone()
        else {
            panic!("expected alarm initial_data");
        };
        assert!(alarms[0].acknowledged);
    }
}
