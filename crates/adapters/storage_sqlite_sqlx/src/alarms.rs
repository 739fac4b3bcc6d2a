//! Rows of the `alarms` table.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection};

use homewatch_domain::alarm::{Alarm, NewAlarm};
use homewatch_domain::id::AlarmId;
use homewatch_domain::time;

use crate::error::StorageError;
use crate::store::timestamp_column;

struct Wrapper(Alarm);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Alarm {
            id: AlarmId::new(row.try_get("id")?),
            device_id: row.try_get("device_id")?,
            alarm_type: row.try_get("alarm_type")?,
            active: row.try_get("active")?,
            acknowledged: row.try_get("acknowledged")?,
            timestamp: timestamp_column(row, "timestamp")?,
            message: row.try_get("message")?,
            priority: row.try_get("priority")?,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO alarms (device_id, alarm_type, active, acknowledged, timestamp, message, priority)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (device_id, alarm_type) DO UPDATE SET
        active = excluded.active,
        acknowledged = excluded.acknowledged,
        timestamp = excluded.timestamp,
        message = excluded.message,
        priority = excluded.priority
    RETURNING *
";

const ACKNOWLEDGE: &str = "UPDATE alarms SET acknowledged = 1 WHERE id = ?";

const SELECT_ORDERED: &str =
    "SELECT * FROM alarms ORDER BY priority DESC, timestamp DESC, id DESC LIMIT ?";

pub(crate) async fn upsert(
    conn: &mut SqliteConnection,
    alarm: &NewAlarm,
) -> Result<Alarm, StorageError> {
    let row: Wrapper = sqlx::query_as(UPSERT)
        .bind(&alarm.device_id)
        .bind(&alarm.alarm_type)
        .bind(alarm.active)
        .bind(alarm.acknowledged)
        .bind(time::format(alarm.timestamp))
        .bind(&alarm.message)
        .bind(alarm.priority)
        .fetch_one(conn)
        .await?;
    Ok(row.0)
}

pub(crate) async fn acknowledge(
    conn: &mut SqliteConnection,
    id: AlarmId,
) -> Result<bool, StorageError> {
    let result = sqlx::query(ACKNOWLEDGE)
        .bind(id.get())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn ordered(
    conn: &mut SqliteConnection,
    limit: usize,
) -> Result<Vec<Alarm>, StorageError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ORDERED)
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(|w| w.0).collect())
}
