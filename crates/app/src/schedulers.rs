//! Trigger schedulers: turn registered triggers into armed jobs.
//!
//! Each concrete scheduler handles one [`TriggerType`];
//! [`UniversalTriggerScheduler`] routes to the right one. Contract violations
//! (double registration, unregistering an unknown trigger, no scheduler for
//! a type) are returned as [`SchedulerError`] and never swallowed.

pub mod astro;
pub mod one_time;
pub mod time;
pub mod universal;

pub use astro::AstroTriggerScheduler;
pub use one_time::{ExpiryHook, OneTimeTriggerScheduler};
pub use time::TimeTriggerScheduler;
pub use universal::UniversalTriggerScheduler;

use std::sync::Arc;
use std::time::Duration;

use timeswitch_domain::error::SchedulerError;
use timeswitch_domain::trigger::{Trigger, TriggerType};

use crate::action_runner::ActionRunner;
use crate::ports::{AstroCalculator, Clock, Coordinates, JobScheduler, StateService};

/// Arms and disarms triggers. Registration is keyed by trigger id.
pub trait TriggerScheduler: Send {
    /// Arm `trigger`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRegistered`] when a trigger with the
    /// same id is armed already.
    fn register(&mut self, trigger: &Trigger) -> Result<(), SchedulerError>;

    /// Disarm `trigger`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotRegistered`] when it is not armed.
    fn unregister(&mut self, trigger: &Trigger) -> Result<(), SchedulerError>;

    /// Disarm everything at once.
    fn destroy(&mut self);
}

/// A [`TriggerScheduler`] dedicated to one trigger type.
pub trait TypedTriggerScheduler: TriggerScheduler {
    fn for_type(&self) -> TriggerType;
}

/// Error for a trigger handed to a scheduler of another type.
pub(crate) fn wrong_type(trigger: &Trigger) -> SchedulerError {
    SchedulerError::NoSchedulerForType(trigger.type_tag().to_string())
}

/// Collaborators shared by every schedule's schedulers.
pub struct SchedulerContext<S> {
    pub jobs: Arc<dyn JobScheduler>,
    pub runner: Arc<ActionRunner<S>>,
    pub astro: Arc<dyn AstroCalculator>,
    pub clock: Arc<dyn Clock>,
    pub coordinates: Coordinates,
    /// Delay before a one-time trigger whose date already passed is destroyed.
    pub one_time_grace: Duration,
}

impl<S> Clone for SchedulerContext<S> {
    fn clone(&self) -> Self {
        Self {
            jobs: Arc::clone(&self.jobs),
            runner: Arc::clone(&self.runner),
            astro: Arc::clone(&self.astro),
            clock: Arc::clone(&self.clock),
            coordinates: self.coordinates,
            one_time_grace: self.one_time_grace,
        }
    }
}

impl<S: StateService + 'static> SchedulerContext<S> {
    /// A dispatcher over time, astro and one-time schedulers for one schedule.
    #[must_use]
    pub fn universal_scheduler(&self, on_expired: ExpiryHook) -> UniversalTriggerScheduler {
        let schedulers: Vec<Box<dyn TypedTriggerScheduler>> = vec![
            Box::new(TimeTriggerScheduler::new(
                Arc::clone(&self.jobs),
                Arc::clone(&self.runner),
            )),
            Box::new(AstroTriggerScheduler::new(
                TimeTriggerScheduler::new(Arc::clone(&self.jobs), Arc::clone(&self.runner)),
                Arc::clone(&self.astro),
                Arc::clone(&self.clock),
                self.coordinates,
            )),
            Box::new(OneTimeTriggerScheduler::new(
                Arc::clone(&self.jobs),
                Arc::clone(&self.runner),
                Arc::clone(&self.clock),
                self.one_time_grace,
                on_expired,
            )),
        ];
        UniversalTriggerScheduler::new(schedulers)
    }
}
