//! Astro trigger scheduler: re-materializes solar triggers every day.
//!
//! An astro trigger cannot be armed as a plain recurring job because the
//! solar event moves from day to day. Instead, for each registered trigger a
//! today-only time trigger is derived and its exact instant is armed as a
//! single-shot job on the inner [`TimeTriggerScheduler`]. A daily job at
//! midnight throws all of them away and derives them again for the new day.
//! Sun times are computed for local noon of the current day, so the events
//! belong to that day whatever the offset from UTC.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{Duration, Local, Timelike};

use timeswitch_domain::error::SchedulerError;
use timeswitch_domain::id::TriggerId;
use timeswitch_domain::time::{LocalTime, Timestamp, local_noon, weekday_number};
use timeswitch_domain::trigger::{AstroTrigger, TimeTrigger, Trigger, TriggerType};
use timeswitch_domain::weekday::Weekdays;

use super::{TimeTriggerScheduler, TriggerScheduler, TypedTriggerScheduler, wrong_type};
use crate::ports::{AstroCalculator, Clock, Coordinates, JobCallback, JobFuture, StateService};

/// Prefix of the ids of the time triggers derived from astro triggers.
pub const MATERIALIZED_PREFIX: &str = "TimeTriggerForAstroTrigger";

fn rollover_id() -> TriggerId {
    TriggerId::derived("AstroTriggerScheduler", "dayStart")
}

struct AstroState<S> {
    inner: TimeTriggerScheduler<S>,
    registered: HashMap<TriggerId, AstroTrigger>,
    scheduled: HashMap<TriggerId, TimeTrigger>,
}

/// Computes today's fire time of astro triggers.
struct Materializer {
    calculator: Arc<dyn AstroCalculator>,
    clock: Arc<dyn Clock>,
    coordinates: Coordinates,
}

impl Materializer {
    /// Today's time trigger for `trigger` and the instant it fires at, if it
    /// still has to fire today.
    fn materialize(
        &self,
        trigger: &AstroTrigger,
        now: LocalTime,
    ) -> Option<(TimeTrigger, Timestamp)> {
        let today = weekday_number(&now);
        if !trigger.weekdays().contains(today) {
            return None;
        }
        let times = self.calculator.sun_times(local_noon(&now)?, self.coordinates);
        let Some(event) = times.get(trigger.astro_time()) else {
            tracing::debug!(
                trigger_id = %trigger.id(),
                astro_time = %trigger.astro_time(),
                "solar event does not occur today"
            );
            return None;
        };
        let at = event + Duration::minutes(i64::from(trigger.shift_in_minutes()));
        let local = at.with_timezone(&Local);
        if local < now || local.date_naive() != now.date_naive() {
            return None;
        }
        let weekdays = Weekdays::single(today).ok()?;
        let hour = u8::try_from(local.hour()).ok()?;
        let minute = u8::try_from(local.minute()).ok()?;
        let time = TimeTrigger::builder()
            .id(TriggerId::derived(MATERIALIZED_PREFIX, trigger.id()))
            .hour(hour)
            .minute(minute)
            .weekdays(weekdays)
            .action(trigger.action().clone())
            .build()
            .ok()?;
        Some((time, at))
    }

    /// Derive and arm today's time trigger for `trigger`.
    fn arm<S: StateService + 'static>(
        &self,
        state: &mut AstroState<S>,
        trigger: &AstroTrigger,
    ) -> Result<(), SchedulerError> {
        let Some((time, at)) = self.materialize(trigger, self.clock.now()) else {
            tracing::debug!(trigger_id = %trigger.id(), "nothing to arm today");
            return Ok(());
        };
        tracing::debug!(
            trigger_id = %trigger.id(),
            hour = time.hour(),
            minute = time.minute(),
            %at,
            "armed astro trigger for today"
        );
        let callback = state
            .inner
            .fire_callback(time.id().clone(), time.action().clone());
        state.inner.schedule_once(time.id().clone(), at, callback)?;
        state.scheduled.insert(trigger.id().clone(), time);
        Ok(())
    }

    /// Drop every materialization and derive them again.
    fn rollover<S: StateService + 'static>(&self, state: &mut AstroState<S>) {
        tracing::info!(triggers = state.registered.len(), "recomputing astro triggers for the new day");
        for (_, time) in state.scheduled.drain() {
            if let Err(error) = state.inner.cancel(time.id()) {
                tracing::warn!(trigger_id = %time.id(), %error, "stale astro materialization");
            }
        }
        let registered: Vec<AstroTrigger> = state.registered.values().cloned().collect();
        for trigger in registered {
            if let Err(error) = self.arm(state, &trigger) {
                tracing::error!(trigger_id = %trigger.id(), %error, "failed to re-arm astro trigger");
            }
        }
    }
}

/// Arms [`Trigger::Astro`] triggers through today-only time triggers.
pub struct AstroTriggerScheduler<S> {
    state: Arc<Mutex<AstroState<S>>>,
    materializer: Arc<Materializer>,
}

impl<S: StateService + 'static> AstroTriggerScheduler<S> {
    /// Create the scheduler and arm its midnight rollover job on `inner`.
    pub fn new(
        inner: TimeTriggerScheduler<S>,
        calculator: Arc<dyn AstroCalculator>,
        clock: Arc<dyn Clock>,
        coordinates: Coordinates,
    ) -> Self {
        let scheduler = Self {
            state: Arc::new(Mutex::new(AstroState {
                inner,
                registered: HashMap::new(),
                scheduled: HashMap::new(),
            })),
            materializer: Arc::new(Materializer {
                calculator,
                clock,
                coordinates,
            }),
        };
        scheduler.arm_rollover(&mut scheduler.lock());
        scheduler
    }

    /// The time trigger armed today for the astro trigger `id`, if any.
    #[must_use]
    pub fn scheduled(&self, id: &TriggerId) -> Option<TimeTrigger> {
        self.lock().scheduled.get(id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, AstroState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm_rollover(&self, state: &mut AstroState<S>) {
        let id = rollover_id();
        if state.inner.is_registered(&id) {
            return;
        }
        let callback = rollover_callback(Arc::downgrade(&self.state), Arc::clone(&self.materializer));
        if let Err(error) = state
            .inner
            .schedule_daily(id, Weekdays::all(), 0, 0, callback)
        {
            tracing::error!(%error, "failed to arm astro rollover");
        }
    }
}

fn rollover_callback<S: StateService + 'static>(
    state: Weak<Mutex<AstroState<S>>>,
    materializer: Arc<Materializer>,
) -> JobCallback {
    Arc::new(move || -> JobFuture {
        if let Some(state) = state.upgrade() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            materializer.rollover(&mut state);
        }
        Box::pin(async {})
    })
}

impl<S: StateService + 'static> TriggerScheduler for AstroTriggerScheduler<S> {
    fn register(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
        let Trigger::Astro(astro) = trigger else {
            return Err(wrong_type(trigger));
        };
        let mut state = self.lock();
        if state.registered.contains_key(astro.id()) {
            return Err(SchedulerError::AlreadyRegistered(astro.id().to_string()));
        }
        self.arm_rollover(&mut state);
        state.registered.insert(astro.id().clone(), astro.clone());
        self.materializer.arm(&mut state, astro)
    }

    fn unregister(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
        if trigger.trigger_type() != TriggerType::Astro {
            return Err(wrong_type(trigger));
        }
        let mut state = self.lock();
        if state.registered.remove(trigger.id()).is_none() {
            return Err(SchedulerError::NotRegistered(trigger.id().to_string()));
        }
        if let Some(time) = state.scheduled.remove(trigger.id()) {
            state.inner.cancel(time.id())?;
        }
        Ok(())
    }

    fn destroy(&mut self) {
        let mut state = self.lock();
        state.inner.destroy();
        state.registered.clear();
        state.scheduled.clear();
    }
}

impl<S: StateService + 'static> TypedTriggerScheduler for AstroTriggerScheduler<S> {
    fn for_type(&self) -> TriggerType {
        TriggerType::Astro
    }
}
