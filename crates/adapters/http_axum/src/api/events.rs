//! Event injection endpoint.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use homewatch_app::ingest;
use homewatch_app::ports::Store;
use homewatch_domain::event::Event;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the submit endpoint.
pub enum SubmitResponse {
    Accepted,
}

impl IntoResponse for SubmitResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `POST /api/events` — enqueue `{"type": ..., "payload": {...}}`.
///
/// The event is handled asynchronously by the dispatch loop; `202` only
/// means it is on the bus.
pub async fn submit<S>(
    State(state): State<AppState<S>>,
    body: Result<Json<Event>, JsonRejection>,
) -> Result<SubmitResponse, ApiError>
where
    S: Store + 'static,
{
    let Json(event) = body?;
    ingest::inject(&state.events, event)?;
    Ok(SubmitResponse::Accepted)
}
