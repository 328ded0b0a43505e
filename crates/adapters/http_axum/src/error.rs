//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use timeswitch_domain::error::{
    CodecError, CommandError, ScheduleError, TimeSwitchError, ValidationError,
};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`TimeSwitchError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(TimeSwitchError);

impl From<TimeSwitchError> for ApiError {
    fn from(err: TimeSwitchError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        Self(err.into())
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            TimeSwitchError::Validation(_)
            | TimeSwitchError::Codec(_)
            | TimeSwitchError::Command(
                CommandError::UnknownCommand(_) | CommandError::InvalidMessage(_),
            ) => StatusCode::BAD_REQUEST,
            TimeSwitchError::Command(CommandError::ScheduleNotFound(_))
            | TimeSwitchError::Schedule(ScheduleError::TriggerNotFound(_)) => StatusCode::NOT_FOUND,
            TimeSwitchError::Schedule(ScheduleError::DuplicateTrigger(_))
            | TimeSwitchError::Scheduler(_) => StatusCode::CONFLICT,
            TimeSwitchError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error message including its causes, `outer: inner`.
    fn message(&self) -> String {
        let mut message = self.0.to_string();
        let mut source = std::error::Error::source(&self.0);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.message(), "state error");
            "internal server error".to_string()
        } else {
            tracing::debug!(%status, error = %self.message(), "request rejected");
            self.message()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
