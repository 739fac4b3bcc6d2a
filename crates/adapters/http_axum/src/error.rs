//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use homewatch_domain::error::HomewatchError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps request and domain failures to an HTTP response with an
/// appropriate status code.
pub enum ApiError {
    /// The request could not be decoded.
    BadRequest(String),
    Domain(HomewatchError),
}

impl From<HomewatchError> for ApiError {
    fn from(err: HomewatchError) -> Self {
        Self::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Domain(err) => match &err {
                HomewatchError::Validation(inner) => (StatusCode::BAD_REQUEST, inner.to_string()),
                HomewatchError::InvalidPayload { source, .. } => {
                    (StatusCode::BAD_REQUEST, format!("{err}: {source}"))
                }
                HomewatchError::Bus(inner) => (StatusCode::SERVICE_UNAVAILABLE, inner.to_string()),
                HomewatchError::Storage(inner) => {
                    tracing::error!(error = %inner, "storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error".to_string(),
                    )
                }
                HomewatchError::Plugin { .. } => {
                    tracing::error!(error = %err, "plugin error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error".to_string(),
                    )
                }
            },
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
