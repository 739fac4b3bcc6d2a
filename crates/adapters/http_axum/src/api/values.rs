//! JSON REST handler for current values.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use homewatch_app::ports::{Store, StoreTransaction};
use homewatch_domain::value::ValueReading;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ValueReading>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/values` — current reading of every device.
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<ListResponse, ApiError>
where
    S: Store + 'static,
{
    let mut tx = state.store.begin().await?;
    let values = tx.current_values().await?;
    tx.commit().await?;
    Ok(ListResponse::Ok(Json(values)))
}
