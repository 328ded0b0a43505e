//! One-time trigger scheduler.
//!
//! A one-time trigger fires once and is then removed from its schedule. The
//! removal is not done here: the scheduler reports the expired trigger
//! through an [`ExpiryHook`] and the owner of the schedule deletes it, which
//! in turn unregisters it from this scheduler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use timeswitch_domain::action::Action;
use timeswitch_domain::error::SchedulerError;
use timeswitch_domain::id::TriggerId;
use timeswitch_domain::trigger::{OneTimeTrigger, Trigger, TriggerType};

use super::{TriggerScheduler, TypedTriggerScheduler, wrong_type};
use crate::action_runner::ActionRunner;
use crate::ports::{Clock, JobCallback, JobFuture, JobHandle, JobRule, JobScheduler, StateService};

/// Called with the id of a one-time trigger that fired or whose date passed.
pub type ExpiryHook = Arc<dyn Fn(TriggerId) + Send + Sync>;

enum Armed {
    Job(JobHandle),
    /// Date already passed; expiry is pending after the grace delay.
    Deferred(CancellationToken),
}

/// Arms [`Trigger::OneTime`] triggers as single-shot jobs.
pub struct OneTimeTriggerScheduler<S> {
    jobs: Arc<dyn JobScheduler>,
    runner: Arc<ActionRunner<S>>,
    clock: Arc<dyn Clock>,
    grace: Duration,
    on_expired: ExpiryHook,
    registered: HashMap<TriggerId, Armed>,
}

impl<S: StateService + 'static> OneTimeTriggerScheduler<S> {
    pub fn new(
        jobs: Arc<dyn JobScheduler>,
        runner: Arc<ActionRunner<S>>,
        clock: Arc<dyn Clock>,
        grace: Duration,
        on_expired: ExpiryHook,
    ) -> Self {
        Self {
            jobs,
            runner,
            clock,
            grace,
            on_expired,
            registered: HashMap::new(),
        }
    }

    fn fire_callback(&self, id: TriggerId, action: Action) -> JobCallback {
        let runner = Arc::clone(&self.runner);
        let on_expired = Arc::clone(&self.on_expired);
        let action = Arc::new(action);
        Arc::new(move || -> JobFuture {
            let runner = Arc::clone(&runner);
            let on_expired = Arc::clone(&on_expired);
            let action = Arc::clone(&action);
            let id = id.clone();
            Box::pin(async move {
                tracing::info!(trigger_id = %id, "one-time trigger fired");
                runner.execute(&action).await;
                on_expired(id);
            })
        })
    }

    fn defer_expiry(&self, trigger: &OneTimeTrigger) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let grace = self.grace;
        let on_expired = Arc::clone(&self.on_expired);
        let id = trigger.id().clone();
        tracing::info!(
            trigger_id = %id,
            date = %trigger.date().to_rfc3339(),
            "one-time trigger date already passed, removing it"
        );
        tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {}
                () = tokio::time::sleep(grace) => on_expired(id),
            }
        });
        token
    }
}

impl<S: StateService + 'static> TriggerScheduler for OneTimeTriggerScheduler<S> {
    fn register(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
        let Trigger::OneTime(one_time) = trigger else {
            return Err(wrong_type(trigger));
        };
        if self.registered.contains_key(one_time.id()) {
            return Err(SchedulerError::AlreadyRegistered(one_time.id().to_string()));
        }
        let now = self.clock.now().with_timezone(&Utc);
        let armed = if one_time.is_past(now) {
            Armed::Deferred(self.defer_expiry(one_time))
        } else {
            let rule = JobRule::At(one_time.date());
            tracing::debug!(trigger_id = %one_time.id(), %rule, "arming one-time job");
            let callback = self.fire_callback(one_time.id().clone(), one_time.action().clone());
            Armed::Job(self.jobs.schedule_job(rule, callback))
        };
        self.registered.insert(one_time.id().clone(), armed);
        Ok(())
    }

    fn unregister(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
        if trigger.trigger_type() != TriggerType::OneTime {
            return Err(wrong_type(trigger));
        }
        let armed = self
            .registered
            .remove(trigger.id())
            .ok_or_else(|| SchedulerError::NotRegistered(trigger.id().to_string()))?;
        disarm(self.jobs.as_ref(), armed);
        Ok(())
    }

    fn destroy(&mut self) {
        for (_, armed) in self.registered.drain() {
            disarm(self.jobs.as_ref(), armed);
        }
    }
}

impl<S: StateService + 'static> TypedTriggerScheduler for OneTimeTriggerScheduler<S> {
    fn for_type(&self) -> TriggerType {
        TriggerType::OneTime
    }
}

fn disarm(jobs: &dyn JobScheduler, armed: Armed) {
    match armed {
        // false once the job completed; nothing left to cancel then
        Armed::Job(handle) => {
            jobs.cancel_job(handle);
        }
        Armed::Deferred(token) => token.cancel(),
    }
}
