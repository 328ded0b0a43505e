//! Common error types used across the workspace.
//!
//! Each concern defines its own typed error; [`TimeSwitchError`] gathers them
//! through `#[from]` conversions so callers can use `?` across layers.

/// Top-level error for timeswitch operations.
#[derive(Debug, thiserror::Error)]
pub enum TimeSwitchError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("codec error")]
    Codec(#[from] CodecError),

    #[error("schedule error")]
    Schedule(#[from] ScheduleError),

    #[error("scheduler error")]
    Scheduler(#[from] SchedulerError),

    #[error("state error")]
    State(#[from] StateError),

    #[error("command error")]
    Command(#[from] CommandError),
}

/// A builder or setter received a value violating a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("weekdays must contain between 1 and 7 entries, got {0}")]
    WeekdayCount(usize),

    #[error("weekday {0} is outside 0..=6")]
    WeekdayOutOfRange(u8),

    #[error("weekday {0} appears more than once")]
    DuplicateWeekday(u8),

    #[error("hour {0} is outside 0..=23")]
    HourOutOfRange(u8),

    #[error("minute {0} is outside 0..=59")]
    MinuteOutOfRange(u8),

    #[error("shift of {0} minutes is outside -{max}..={max}", max = crate::trigger::MAX_SHIFT_IN_MINUTES)]
    ShiftOutOfRange(i32),

    #[error("identifier must not be empty")]
    EmptyId,

    #[error("list of states to set must not be empty")]
    NoStatesToSet,

    #[error("value {value} does not match value type {expected}")]
    ValueTypeMismatch {
        expected: crate::value::ValueType,
        value: String,
    },

    #[error("required field `{0}` was not provided")]
    MissingField(&'static str),

    #[error("name must not be empty")]
    EmptyName,
}

/// Failure while converting between domain values and their JSON envelopes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("expected type `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },

    #[error("no codec registered for type `{0}`")]
    NoCodecFound(String),

    #[error("unknown action reference `{0}`")]
    UnknownReferenceName(String),

    #[error("field `{field}` is invalid: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("decoded value is invalid")]
    Validation(#[from] ValidationError),

    #[error("malformed JSON")]
    Json(#[from] serde_json::Error),
}

/// Violation of a schedule's trigger-list invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("trigger `{0}` already exists")]
    DuplicateTrigger(String),

    #[error("trigger `{0}` not found")]
    TriggerNotFound(String),
}

/// Scheduler contract violation. These signal programmer errors and are
/// returned to the caller rather than swallowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("trigger `{0}` is already registered")]
    AlreadyRegistered(String),

    #[error("trigger `{0}` is not registered")]
    NotRegistered(String),

    #[error("no scheduler handles trigger type `{0}`")]
    NoSchedulerForType(String),
}

/// Failure reading or writing an external state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("state `{0}` does not exist or has no value")]
    NotFound(String),

    #[error("state `{id}` could not be accessed: {reason}")]
    Access { id: String, reason: String },
}

/// Rejected command-channel message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("no schedule found for data id `{0}`")]
    ScheduleNotFound(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
