//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use homewatch_app::ports::Store;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the JSON API under `/api` and mounts one WebSocket endpoint per
/// push topic. Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<S>(state: AppState<S>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/dashboard/ws", get(crate::ws::dashboard::<S>))
        .route("/protocol/ws", get(crate::ws::protocol::<S>))
        .route("/alarm/ws", get(crate::ws::alarm::<S>))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
