//! Snapshot port — full current state per topic.

use async_trait::async_trait;

use homewatch_domain::error::HomewatchError;
use homewatch_domain::message::Snapshot;
use homewatch_domain::topic::Topic;

/// Produces the complete current state delivered to a newly joined
/// subscriber.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Read the snapshot for `topic`.
    async fn snapshot(&self, topic: Topic) -> Result<Snapshot, HomewatchError>;
}
