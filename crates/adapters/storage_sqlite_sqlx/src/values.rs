//! Rows of the `value_readings` table.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection};

use homewatch_domain::time;
use homewatch_domain::value::ValueReading;

use crate::error::StorageError;
use crate::store::timestamp_column;

struct Wrapper(ValueReading);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<ValueReading> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(ValueReading {
            device_id: row.try_get("device_id")?,
            timestamp: timestamp_column(row, "timestamp")?,
            value_type: row.try_get("value_type")?,
            value: row.try_get("value")?,
            unit: row.try_get("unit")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO value_readings (device_id, timestamp, value_type, value, unit)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT (device_id, timestamp) DO NOTHING
";

const SELECT_CURRENT_FOR_DEVICE: &str =
    "SELECT * FROM value_readings WHERE device_id = ? ORDER BY timestamp DESC LIMIT 1";

const SELECT_CURRENT: &str = r"
    SELECT v.*
    FROM value_readings v
    JOIN (
        SELECT device_id, MAX(timestamp) AS latest
        FROM value_readings
        GROUP BY device_id
    ) l ON v.device_id = l.device_id AND v.timestamp = l.latest
    ORDER BY v.device_id
";

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    reading: &ValueReading,
) -> Result<bool, StorageError> {
    let result = sqlx::query(INSERT)
        .bind(&reading.device_id)
        .bind(time::format(reading.timestamp))
        .bind(&reading.value_type)
        .bind(&reading.value)
        .bind(reading.unit.as_deref())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn current_for_device(
    conn: &mut SqliteConnection,
    device_id: &str,
) -> Result<Option<ValueReading>, StorageError> {
    let row: Option<Wrapper> = sqlx::query_as(SELECT_CURRENT_FOR_DEVICE)
        .bind(device_id)
        .fetch_optional(conn)
        .await?;
    Ok(Wrapper::maybe(row))
}

pub(crate) async fn current(conn: &mut SqliteConnection) -> Result<Vec<ValueReading>, StorageError> {
    let rows: Vec<Wrapper> = sqlx::query_as(SELECT_CURRENT).fetch_all(conn).await?;
    Ok(rows.into_iter().map(|w| w.0).collect())
}
