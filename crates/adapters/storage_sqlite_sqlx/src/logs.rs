//! Rows of the `logs` table.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection};

use homewatch_domain::id::LogEntryId;
use homewatch_domain::log_entry::{LogEntry, LogLevel, NewLogEntry};
use homewatch_domain::time;

use crate::error::{StorageError, decode_error};
use crate::store::timestamp_column;

struct Wrapper(LogEntry);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let level: String = row.try_get("level")?;
        Ok(Self(LogEntry {
            id: LogEntryId::new(row.try_get("id")?),
            timestamp: timestamp_column(row, "timestamp")?,
            message: row.try_get("message")?,
            protocol: row.try_get("protocol")?,
            level: level.parse::<LogLevel>().map_err(decode_error)?,
            ref_id: row.try_get("ref_id")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO logs (timestamp, message, protocol, level, ref_id)
    VALUES (?, ?, ?, ?, ?)
    RETURNING id
";

const SELECT_RECENT: &str = "SELECT * FROM logs ORDER BY timestamp DESC, id DESC LIMIT ?";

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    entry: NewLogEntry,
) -> Result<LogEntry, StorageError> {
    let (id,): (i64,) = sqlx::query_as(INSERT)
        .bind(time::format(entry.timestamp))
        .bind(&entry.message)
        .bind(&entry.protocol)
        .bind(entry.level.as_str())
        .bind(entry.ref_id.as_deref())
        .fetch_one(conn)
        .await?;
    Ok(entry.into_entry(LogEntryId::new(id)))
}

pub(crate) async fn recent(
    conn: &mut SqliteConnection,
    limit: usize,
) -> Result<Vec<LogEntry>, StorageError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(|w| w.0).collect())
}
