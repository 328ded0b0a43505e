//! Schedule inspection handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use timeswitch_app::ports::StateService;
use timeswitch_domain::error::CodecError;
use timeswitch_domain::id::StateId;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<String>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Value>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/schedules`: data ids of every loaded schedule.
pub async fn list<S>(State(state): State<AppState<S>>) -> ListResponse
where
    S: StateService + 'static,
{
    let ids = state
        .processor
        .data_ids()
        .await
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    ListResponse::Ok(Json(ids))
}

/// `GET /api/schedules/{data_id}`: the schedule as it is written back to
/// its data state.
pub async fn get<S>(
    State(state): State<AppState<S>>,
    Path(data_id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: StateService + 'static,
{
    let data_id = StateId::new(data_id)?;
    let json = state.processor.serialized(&data_id).await?;
    let value: Value = serde_json::from_str(&json).map_err(CodecError::from)?;
    Ok(GetResponse::Ok(Json(value)))
}
