//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod commands;
#[allow(clippy::missing_errors_doc)]
pub mod schedules;

use axum::Router;
use axum::routing::{get, post};

use timeswitch_app::ports::StateService;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: StateService + 'static,
{
    Router::new()
        .route("/commands", post(commands::submit::<S>))
        .route("/schedules", get(schedules::list::<S>))
        .route("/schedules/{data_id}", get(schedules::get::<S>))
}
