//! `SQLite` implementation of [`Store`] and [`StoreTransaction`].

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

use homewatch_app::ports::{Store, StoreTransaction};
use homewatch_domain::alarm::{Alarm, NewAlarm};
use homewatch_domain::error::HomewatchError;
use homewatch_domain::id::AlarmId;
use homewatch_domain::log_entry::{LogEntry, NewLogEntry};
use homewatch_domain::time::{self, Timestamp};
use homewatch_domain::value::ValueReading;

use crate::error::{StorageError, decode_error};
use crate::{alarms, logs, values};

/// Read a timestamp stored as text.
pub(crate) fn timestamp_column(row: &SqliteRow, column: &str) -> Result<Timestamp, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    time::parse(&raw).map_err(decode_error)
}

/// `SQLite`-backed store. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl Store for SqliteStore {
    type Transaction = SqliteTransaction;

    async fn begin(&self) -> Result<SqliteTransaction, HomewatchError> {
        let tx = self.pool.begin().await.map_err(StorageError::from)?;
        Ok(SqliteTransaction { tx })
    }
}

/// One database transaction. Rolled back when dropped without
/// [`commit`](StoreTransaction::commit).
pub struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl StoreTransaction for SqliteTransaction {
    async fn append_log(&mut self, entry: NewLogEntry) -> Result<LogEntry, HomewatchError> {
        Ok(logs::insert(&mut self.tx, entry).await?)
    }

    async fn recent_logs(&mut self, limit: usize) -> Result<Vec<LogEntry>, HomewatchError> {
        Ok(logs::recent(&mut self.tx, limit).await?)
    }

    #[tracing::instrument(skip_all, fields(device_id = %reading.device_id))]
    async fn insert_value(&mut self, reading: &ValueReading) -> Result<bool, HomewatchError> {
        let inserted = values::insert(&mut self.tx, reading).await?;
        if !inserted {
            tracing::debug!(timestamp = %reading.timestamp, "reading already stored");
        }
        Ok(inserted)
    }

    async fn current_value(
        &mut self,
        device_id: &str,
    ) -> Result<Option<ValueReading>, HomewatchError> {
        Ok(values::current_for_device(&mut self.tx, device_id).await?)
    }

    async fn current_values(&mut self) -> Result<Vec<ValueReading>, HomewatchError> {
        Ok(values::current(&mut self.tx).await?)
    }

    async fn upsert_alarm(&mut self, alarm: NewAlarm) -> Result<Alarm, HomewatchError> {
        Ok(alarms::upsert(&mut self.tx, &alarm).await?)
    }

    async fn acknowledge_alarm(&mut self, id: AlarmId) -> Result<bool, HomewatchError> {
        Ok(alarms::acknowledge(&mut self.tx, id).await?)
    }

    async fn alarms(&mut self, limit: usize) -> Result<Vec<Alarm>, HomewatchError> {
        Ok(alarms::ordered(&mut self.tx, limit).await?)
    }

    async fn commit(self) -> Result<(), HomewatchError> {
        self.tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}
