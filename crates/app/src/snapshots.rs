//! Store-backed [`SnapshotSource`].

use async_trait::async_trait;

use homewatch_domain::error::HomewatchError;
use homewatch_domain::message::Snapshot;
use homewatch_domain::topic::Topic;

use crate::handlers::ALARM_LIST_LIMIT;
use crate::ports::{SnapshotSource, Store, StoreTransaction};

/// Number of log entries sent to a new protocol subscriber.
pub const PROTOCOL_SNAPSHOT_LIMIT: usize = 20;

/// Reads each topic's current state in a short read-only transaction.
pub struct StoreSnapshots<S> {
    store: S,
}

impl<S: Store> StoreSnapshots<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: Store> SnapshotSource for StoreSnapshots<S> {
    #[tracing::instrument(skip(self))]
    async fn snapshot(&self, topic: Topic) -> Result<Snapshot, HomewatchError> {
        let mut tx = self.store.begin().await?;
        let snapshot = match topic {
            Topic::Protocol => Snapshot::Entries {
                entries: tx.recent_logs(PROTOCOL_SNAPSHOT_LIMIT).await?,
            },
            Topic::Dashboard => Snapshot::Values {
                values: tx.current_values().await?,
            },
            Topic::Alarm => Snapshot::Alarms {
                alarms: tx.alarms(ALARM_LIST_LIMIT).await?,
            },
        };
        tx.commit().await?;
        Ok(snapshot)
    }
}
