//! JSON REST handler for log entries.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};

use homewatch_app::ports::{Store, StoreTransaction};
use homewatch_app::snapshots::PROTOCOL_SNAPSHOT_LIMIT;
use homewatch_domain::log_entry::LogEntry;

use super::LimitQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<LogEntry>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/logs?limit=` — most recent log entries, newest first.
pub async fn list<S>(
    State(state): State<AppState<S>>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<ListResponse, ApiError>
where
    S: Store + 'static,
{
    let Query(query) = query?;
    let mut tx = state.store.begin().await?;
    let entries = tx.recent_logs(query.resolve(PROTOCOL_SNAPSHOT_LIMIT)).await?;
    tx.commit().await?;
    Ok(ListResponse::Ok(Json(entries)))
}
