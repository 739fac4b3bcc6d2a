//! Store port — scoped, transactional persistence for log entries, value
//! readings and alarms.
//!
//! Every handler invocation opens its own [`StoreTransaction`] with
//! [`Store::begin`], performs its reads and writes, and calls
//! [`StoreTransaction::commit`]. A transaction dropped without committing is
//! rolled back, so an early return through `?` never leaves partial writes.

use std::future::Future;

use homewatch_domain::alarm::{Alarm, NewAlarm};
use homewatch_domain::error::HomewatchError;
use homewatch_domain::id::AlarmId;
use homewatch_domain::log_entry::{LogEntry, NewLogEntry};
use homewatch_domain::value::ValueReading;

/// Entry point to the persistence layer.
pub trait Store: Send + Sync {
    /// The transaction type handed out by [`begin`](Self::begin).
    type Transaction: StoreTransaction + Send;

    /// Acquire a new transaction scope.
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, HomewatchError>> + Send;
}

impl<S: Store> Store for std::sync::Arc<S> {
    type Transaction = S::Transaction;

    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, HomewatchError>> + Send {
        (**self).begin()
    }
}

/// Operations available inside one transaction scope.
pub trait StoreTransaction {
    /// Append a log entry; the store assigns its id.
    fn append_log(
        &mut self,
        entry: NewLogEntry,
    ) -> impl Future<Output = Result<LogEntry, HomewatchError>> + Send;

    /// The most recent log entries, newest first.
    fn recent_logs(
        &mut self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LogEntry>, HomewatchError>> + Send;

    /// Insert a reading. Returns `false` without error when a reading with
    /// the same `(device_id, timestamp)` already exists.
    fn insert_value(
        &mut self,
        reading: &ValueReading,
    ) -> impl Future<Output = Result<bool, HomewatchError>> + Send;

    /// The reading with the greatest timestamp for `device_id`.
    fn current_value(
        &mut self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<ValueReading>, HomewatchError>> + Send;

    /// The current reading of every device, ordered by device id.
    fn current_values(
        &mut self,
    ) -> impl Future<Output = Result<Vec<ValueReading>, HomewatchError>> + Send;

    /// Insert or overwrite the alarm keyed by `(device_id, alarm_type)`.
    fn upsert_alarm(
        &mut self,
        alarm: NewAlarm,
    ) -> impl Future<Output = Result<Alarm, HomewatchError>> + Send;

    /// Set `acknowledged = true` on the alarm row `id`. Returns `false` when
    /// no such row exists.
    fn acknowledge_alarm(
        &mut self,
        id: AlarmId,
    ) -> impl Future<Output = Result<bool, HomewatchError>> + Send;

    /// Alarms ordered by priority descending then timestamp descending.
    fn alarms(
        &mut self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Alarm>, HomewatchError>> + Send;

    /// Make every write of this scope durable.
    fn commit(self) -> impl Future<Output = Result<(), HomewatchError>> + Send;
}
