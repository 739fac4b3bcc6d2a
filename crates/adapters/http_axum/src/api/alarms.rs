//! JSON REST handler for alarms.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};

use homewatch_app::handlers::ALARM_LIST_LIMIT;
use homewatch_app::ports::{Store, StoreTransaction};
use homewatch_domain::alarm::Alarm;

use super::LimitQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Alarm>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/alarms?limit=` — alarms by priority, most recent first.
pub async fn list<S>(
    State(state): State<AppState<S>>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<ListResponse, ApiError>
where
    S: Store + 'static,
{
    let Query(query) = query?;
    let mut tx = state.store.begin().await?;
    let alarms = tx.alarms(query.resolve(ALARM_LIST_LIMIT)).await?;
    tx.commit().await?;
    Ok(ListResponse::Ok(Json(alarms)))
}
