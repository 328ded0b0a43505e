//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use timeswitch_app::ports::StateService;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API under `/api` and traces each request with [`TraceLayer`].
pub fn build<S>(state: AppState<S>) -> Router
where
    S: StateService + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
