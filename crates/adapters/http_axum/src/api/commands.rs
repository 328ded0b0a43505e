//! Command channel handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use timeswitch_app::command::CommandRequest;
use timeswitch_app::ports::StateService;
use timeswitch_domain::error::CommandError;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the submit endpoint.
pub enum SubmitResponse {
    Applied,
}

impl IntoResponse for SubmitResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Applied => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `POST /api/commands`
///
/// The body is `{"command": "...", "message": {"dataId": "...", ...}}`.
/// Responds once the command has been applied and the schedule written back.
pub async fn submit<S>(
    State(state): State<AppState<S>>,
    Json(body): Json<Value>,
) -> Result<SubmitResponse, ApiError>
where
    S: StateService + 'static,
{
    let request: CommandRequest = serde_json::from_value(body)
        .map_err(|err| CommandError::InvalidMessage(err.to_string()))?;
    state.processor.handle_request(&request).await?;
    Ok(SubmitResponse::Applied)
}
