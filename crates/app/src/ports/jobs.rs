//! Job port: the timer primitive triggers are armed with.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use timeswitch_domain::time::Timestamp;
use timeswitch_domain::weekday::Weekdays;

/// Future returned by a job callback.
pub type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Invoked every time a job fires.
pub type JobCallback = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// When a job fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRule {
    /// Every listed weekday at `hour:minute` local time.
    Recurring {
        weekdays: Weekdays,
        hour: u8,
        minute: u8,
    },
    /// Once, at an absolute instant.
    At(Timestamp),
}

impl fmt::Display for JobRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recurring {
                weekdays,
                hour,
                minute,
            } => write!(f, "{hour:02}:{minute:02} on {:?}", weekdays.as_slice()),
            Self::At(at) => write!(f, "at {}", at.to_rfc3339()),
        }
    }
}

/// Opaque handle identifying a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(u64);

impl JobHandle {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Schedules callbacks according to a [`JobRule`].
///
/// Callbacks run on the implementation's own tasks, concurrently with
/// whatever scheduled them.
pub trait JobScheduler: Send + Sync {
    fn schedule_job(&self, rule: JobRule, callback: JobCallback) -> JobHandle;

    /// Cancel a job. Returns `false` when the handle is unknown or the job
    /// already completed.
    fn cancel_job(&self, handle: JobHandle) -> bool;
}

impl<T: JobScheduler + ?Sized> JobScheduler for Arc<T> {
    fn schedule_job(&self, rule: JobRule, callback: JobCallback) -> JobHandle {
        (**self).schedule_job(rule, callback)
    }

    fn cancel_job(&self, handle: JobHandle) -> bool {
        (**self).cancel_job(handle)
    }
}
