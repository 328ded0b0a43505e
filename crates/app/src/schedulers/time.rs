//! Time trigger scheduler: one recurring job per trigger.

use std::collections::HashMap;
use std::sync::Arc;

use timeswitch_domain::action::Action;
use timeswitch_domain::error::SchedulerError;
use timeswitch_domain::id::TriggerId;
use timeswitch_domain::time::Timestamp;
use timeswitch_domain::trigger::{Trigger, TriggerType};
use timeswitch_domain::weekday::Weekdays;

use super::{TriggerScheduler, TypedTriggerScheduler, wrong_type};
use crate::action_runner::ActionRunner;
use crate::ports::{JobCallback, JobFuture, JobHandle, JobRule, JobScheduler, StateService};

/// Arms [`Trigger::Time`] triggers as recurring jobs.
pub struct TimeTriggerScheduler<S> {
    jobs: Arc<dyn JobScheduler>,
    runner: Arc<ActionRunner<S>>,
    registered: HashMap<TriggerId, JobHandle>,
}

impl<S: StateService + 'static> TimeTriggerScheduler<S> {
    pub fn new(jobs: Arc<dyn JobScheduler>, runner: Arc<ActionRunner<S>>) -> Self {
        Self {
            jobs,
            runner,
            registered: HashMap::new(),
        }
    }

    #[must_use]
    pub fn is_registered(&self, id: &TriggerId) -> bool {
        self.registered.contains_key(id)
    }

    /// Arm `callback` on `weekdays` at `hour:minute` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRegistered`] when `id` is taken.
    pub fn schedule_daily(
        &mut self,
        id: TriggerId,
        weekdays: Weekdays,
        hour: u8,
        minute: u8,
        callback: JobCallback,
    ) -> Result<(), SchedulerError> {
        if self.registered.contains_key(&id) {
            return Err(SchedulerError::AlreadyRegistered(id.to_string()));
        }
        let rule = JobRule::Recurring {
            weekdays,
            hour,
            minute,
        };
        tracing::debug!(trigger_id = %id, %rule, "arming recurring job");
        let handle = self.jobs.schedule_job(rule, callback);
        self.registered.insert(id, handle);
        Ok(())
    }

    /// Arm `callback` once at `at` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRegistered`] when `id` is taken.
    pub fn schedule_once(
        &mut self,
        id: TriggerId,
        at: Timestamp,
        callback: JobCallback,
    ) -> Result<(), SchedulerError> {
        if self.registered.contains_key(&id) {
            return Err(SchedulerError::AlreadyRegistered(id.to_string()));
        }
        let rule = JobRule::At(at);
        tracing::debug!(trigger_id = %id, %rule, "arming single-shot job");
        let handle = self.jobs.schedule_job(rule, callback);
        self.registered.insert(id, handle);
        Ok(())
    }

    /// Disarm the job registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotRegistered`] when nothing is armed under `id`.
    pub fn cancel(&mut self, id: &TriggerId) -> Result<(), SchedulerError> {
        let handle = self
            .registered
            .remove(id)
            .ok_or_else(|| SchedulerError::NotRegistered(id.to_string()))?;
        self.jobs.cancel_job(handle);
        tracing::debug!(trigger_id = %id, "disarmed job");
        Ok(())
    }

    pub(super) fn fire_callback(&self, id: TriggerId, action: Action) -> JobCallback {
        let runner = Arc::clone(&self.runner);
        let action = Arc::new(action);
        Arc::new(move || -> JobFuture {
            let runner = Arc::clone(&runner);
            let action = Arc::clone(&action);
            let id = id.clone();
            Box::pin(async move {
                tracing::info!(trigger_id = %id, "time trigger fired");
                runner.execute(&action).await;
            })
        })
    }
}

impl<S: StateService + 'static> TriggerScheduler for TimeTriggerScheduler<S> {
    fn register(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
        let Trigger::Time(time) = trigger else {
            return Err(wrong_type(trigger));
        };
        let callback = self.fire_callback(time.id().clone(), time.action().clone());
        self.schedule_daily(
            time.id().clone(),
            time.weekdays().clone(),
            time.hour(),
            time.minute(),
            callback,
        )
    }

    fn unregister(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
        if trigger.trigger_type() != TriggerType::Time {
            return Err(wrong_type(trigger));
        }
        self.cancel(trigger.id())
    }

    fn destroy(&mut self) {
        for (id, handle) in self.registered.drain() {
            self.jobs.cancel_job(handle);
            tracing::debug!(trigger_id = %id, "disarmed job");
        }
    }
}

impl<S: StateService + 'static> TypedTriggerScheduler for TimeTriggerScheduler<S> {
    fn for_type(&self) -> TriggerType {
        TriggerType::Time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_runner::tests::InMemoryStates;
    use crate::schedulers::testing::RecordingJobScheduler;
    use timeswitch_domain::action::SetStateValueAction;
    use timeswitch_domain::id::StateId;
    use timeswitch_domain::trigger::TimeTrigger;
    use timeswitch_domain::value::{StateValue, ValueType};

    fn trigger(id: &str) -> Trigger {
        let action = SetStateValueAction::new(
            StateId::new("blind.level").unwrap(),
            ValueType::Number,
            StateValue::Number(30.0),
        )
        .unwrap();
        TimeTrigger::builder()
            .id(TriggerId::new(id).unwrap())
            .hour(7)
            .minute(45)
            .weekdays(Weekdays::new(vec![1, 3, 5]).unwrap())
            .action(action.into())
            .build()
            .unwrap()
            .into()
    }

    fn setup() -> (
        Arc<RecordingJobScheduler>,
        Arc<ActionRunner<InMemoryStates>>,
        TimeTriggerScheduler<InMemoryStates>,
    ) {
        let jobs = Arc::new(RecordingJobScheduler::default());
        let runner = Arc::new(ActionRunner::new(InMemoryStates::default()));
        let scheduler = TimeTriggerScheduler::new(jobs.clone(), Arc::clone(&runner));
        (jobs, runner, scheduler)
    }

    #[tokio::test]
    async fn should_arm_recurring_job_and_execute_action_when_fired() {
        let (jobs, runner, mut scheduler) = setup();
        scheduler.register(&trigger("0")).unwrap();

        assert_eq!(
            jobs.active_rules(),
            vec![JobRule::Recurring {
                weekdays: Weekdays::new(vec![1, 3, 5]).unwrap(),
                hour: 7,
                minute: 45,
            }]
        );
        jobs.fire(0).await;
        assert_eq!(
            runner.states().value("blind.level"),
            Some(StateValue::Number(30.0))
        );
    }

    #[test]
    fn should_reject_second_registration_of_same_trigger() {
        let (_, _, mut scheduler) = setup();
        scheduler.register(&trigger("0")).unwrap();
        assert_eq!(
            scheduler.register(&trigger("0")),
            Err(SchedulerError::AlreadyRegistered("0".to_string()))
        );
    }

    #[test]
    fn should_reject_unregistering_unknown_trigger() {
        let (_, _, mut scheduler) = setup();
        assert_eq!(
            scheduler.unregister(&trigger("3")),
            Err(SchedulerError::NotRegistered("3".to_string()))
        );
    }

    #[test]
    fn should_cancel_job_when_unregistered() {
        let (jobs, _, mut scheduler) = setup();
        scheduler.register(&trigger("0")).unwrap();
        scheduler.unregister(&trigger("0")).unwrap();
        assert!(jobs.active_rules().is_empty());
        assert!(!scheduler.is_registered(&TriggerId::new("0").unwrap()));
    }

    #[test]
    fn should_cancel_every_job_when_destroyed() {
        let (jobs, _, mut scheduler) = setup();
        scheduler.register(&trigger("0")).unwrap();
        scheduler.register(&trigger("1")).unwrap();
        scheduler.destroy();
        assert_eq!(jobs.cancelled_count(), 2);
        scheduler.register(&trigger("0")).unwrap();
    }

    #[test]
    fn should_share_ids_between_single_shot_and_recurring_jobs() {
        let (jobs, _, mut scheduler) = setup();
        let at = chrono::Utc::now();
        let noop: JobCallback = Arc::new(|| -> JobFuture { Box::pin(async {}) });
        scheduler
            .schedule_once(TriggerId::new("0").unwrap(), at, Arc::clone(&noop))
            .unwrap();
        assert_eq!(jobs.active_rules(), vec![JobRule::At(at)]);
        assert_eq!(
            scheduler.register(&trigger("0")),
            Err(SchedulerError::AlreadyRegistered("0".to_string()))
        );
        scheduler.cancel(&TriggerId::new("0").unwrap()).unwrap();
        assert!(jobs.active_rules().is_empty());
    }
}
