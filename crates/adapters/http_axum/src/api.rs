//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod alarms;
#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod logs;
#[allow(clippy::missing_errors_doc)]
pub mod values;

use axum::Router;
use axum::routing::{get, post};
use serde::Deserialize;

use homewatch_app::ports::Store;

use crate::state::AppState;

/// Largest page any list endpoint returns.
pub const MAX_LIMIT: usize = 1000;

/// `?limit=` query shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    /// The requested limit, or `default`, capped at [`MAX_LIMIT`].
    #[must_use]
    pub fn resolve(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).min(MAX_LIMIT)
    }
}

/// Build the `/api` sub-router.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: Store + 'static,
{
    Router::new()
        .route("/values", get(values::list::<S>))
        .route("/alarms", get(alarms::list::<S>))
        .route("/logs", get(logs::list::<S>))
        .route("/events", post(events::submit::<S>))
}
