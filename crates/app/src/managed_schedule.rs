//! Managed schedule: keeps an [`OnOffSchedule`] and its trigger scheduler in
//! sync.
//!
//! While the schedule is enabled every trigger is registered with the
//! scheduler, resolved against the schedule's action arena. Disabling tears
//! everything down at once through [`TriggerScheduler::destroy`] and keeps the
//! trigger list.

use std::collections::BTreeSet;

use timeswitch_domain::action::{ActionSlot, OnOffStateAction};
use timeswitch_domain::error::{ScheduleError, TimeSwitchError};
use timeswitch_domain::id::{StateId, TriggerId};
use timeswitch_domain::schedule::OnOffSchedule;
use timeswitch_domain::trigger::Trigger;
use timeswitch_domain::value::{StateValue, ValueType};

use crate::schedulers::TriggerScheduler;

/// An [`OnOffSchedule`] bound to the scheduler arming its triggers.
pub struct ManagedSchedule {
    schedule: OnOffSchedule,
    scheduler: Box<dyn TriggerScheduler>,
}

impl ManagedSchedule {
    /// Take ownership of `schedule`, registering its triggers when it is
    /// enabled.
    ///
    /// # Errors
    ///
    /// Returns the scheduler's error when a trigger cannot be registered; the
    /// scheduler is left empty in that case.
    pub fn new(
        schedule: OnOffSchedule,
        scheduler: Box<dyn TriggerScheduler>,
    ) -> Result<Self, TimeSwitchError> {
        let mut managed = Self {
            schedule,
            scheduler,
        };
        if managed.schedule.is_enabled() {
            managed.register_all()?;
        }
        Ok(managed)
    }

    #[must_use]
    pub fn schedule(&self) -> &OnOffSchedule {
        &self.schedule
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.schedule.is_enabled()
    }

    /// Enable or disable the schedule. Setting the current value does nothing.
    ///
    /// # Errors
    ///
    /// Returns the scheduler's error when enabling fails; the schedule stays
    /// disabled then.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), TimeSwitchError> {
        if enabled == self.schedule.is_enabled() {
            return Ok(());
        }
        if enabled {
            self.schedule.set_enabled(true);
            if let Err(error) = self.register_all() {
                self.schedule.set_enabled(false);
                return Err(error);
            }
        } else {
            self.scheduler.destroy();
            self.schedule.set_enabled(false);
        }
        tracing::info!(schedule = self.schedule.name(), enabled, "schedule toggled");
        Ok(())
    }

    /// Add a trigger, registering it right away when enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::DuplicateTrigger`] when the id is taken.
    pub fn add_trigger(&mut self, trigger: Trigger) -> Result<(), TimeSwitchError> {
        if self.schedule.trigger(trigger.id()).is_some() {
            return Err(ScheduleError::DuplicateTrigger(trigger.id().to_string()).into());
        }
        if self.is_enabled() {
            self.scheduler.register(&self.schedule.resolve(&trigger))?;
        }
        self.schedule.add_trigger(trigger)?;
        Ok(())
    }

    /// Replace the trigger with the same id. The schedule is only changed
    /// once the replacement is armed.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::TriggerNotFound`] for an unknown id, or the
    /// scheduler's error; the old trigger stays in place then.
    pub fn update_trigger(&mut self, trigger: Trigger) -> Result<(), TimeSwitchError> {
        let old = self
            .schedule
            .trigger(trigger.id())
            .cloned()
            .ok_or_else(|| ScheduleError::TriggerNotFound(trigger.id().to_string()))?;
        if self.is_enabled() {
            self.scheduler.unregister(&old)?;
            if let Err(error) = self.scheduler.register(&self.schedule.resolve(&trigger)) {
                if let Err(rearm) = self.scheduler.register(&self.schedule.resolve(&old)) {
                    tracing::error!(trigger_id = %old.id(), error = %rearm, "failed to re-arm replaced trigger");
                }
                return Err(error.into());
            }
        }
        self.schedule.update_trigger(trigger)?;
        Ok(())
    }

    /// Remove the trigger with `id`, unregistering it first when enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::TriggerNotFound`] for an unknown id.
    pub fn remove_trigger(&mut self, id: &TriggerId) -> Result<Trigger, TimeSwitchError> {
        let trigger = self
            .schedule
            .trigger(id)
            .ok_or_else(|| ScheduleError::TriggerNotFound(id.to_string()))?;
        if self.schedule.is_enabled() {
            self.scheduler.unregister(trigger)?;
        }
        Ok(self.schedule.remove_trigger(id)?)
    }

    /// Install a new canonical "on" action.
    ///
    /// # Errors
    ///
    /// Returns the scheduler's error when re-registering a trigger fails.
    pub fn set_on_action(&mut self, action: OnOffStateAction) -> Result<(), TimeSwitchError> {
        let affected = self.schedule.replace_action(ActionSlot::On, action);
        self.reregister(affected)
    }

    /// Install a new canonical "off" action.
    ///
    /// # Errors
    ///
    /// Returns the scheduler's error when re-registering a trigger fails.
    pub fn set_off_action(&mut self, action: OnOffStateAction) -> Result<(), TimeSwitchError> {
        let affected = self.schedule.replace_action(ActionSlot::Off, action);
        self.reregister(affected)
    }

    /// Replace both canonical actions with a new value type and values,
    /// keeping the switched states.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`](timeswitch_domain::error::ValidationError)
    /// when the values do not match `value_type`, or the scheduler's error.
    pub fn set_switched_values(
        &mut self,
        value_type: ValueType,
        on_value: StateValue,
        off_value: StateValue,
    ) -> Result<(), TimeSwitchError> {
        let ids = self.schedule.on_action().ids_of_states_to_set().to_vec();
        let (on, off) = OnOffStateAction::pair(value_type, ids, on_value, off_value)?;
        let affected: BTreeSet<TriggerId> = self
            .schedule
            .replace_action(ActionSlot::On, on)
            .into_iter()
            .chain(self.schedule.replace_action(ActionSlot::Off, off))
            .collect();
        self.reregister(affected)
    }

    /// Replace the states switched by both canonical actions.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoStatesToSet`](timeswitch_domain::error::ValidationError::NoStatesToSet)
    /// for an empty list, or the scheduler's error.
    pub fn set_switched_ids(&mut self, ids: Vec<StateId>) -> Result<(), TimeSwitchError> {
        let affected = self.schedule.set_switched_ids(ids)?;
        self.reregister(affected)
    }

    /// Rename the schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`](timeswitch_domain::error::ValidationError::EmptyName)
    /// for an empty name.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), TimeSwitchError> {
        self.schedule.set_name(name)?;
        Ok(())
    }

    #[must_use]
    pub fn next_trigger_id(&self) -> TriggerId {
        self.schedule.next_trigger_id()
    }

    /// Disarm every trigger. The schedule keeps its enabled flag and triggers.
    pub fn destroy(&mut self) {
        self.scheduler.destroy();
    }

    fn register(&mut self, id: &TriggerId) -> Result<(), TimeSwitchError> {
        let trigger = self
            .schedule
            .trigger(id)
            .ok_or_else(|| ScheduleError::TriggerNotFound(id.to_string()))?;
        let resolved = self.schedule.resolve(trigger);
        self.scheduler.register(&resolved)?;
        Ok(())
    }

    fn register_all(&mut self) -> Result<(), TimeSwitchError> {
        let resolved: Vec<Trigger> = self
            .schedule
            .triggers()
            .iter()
            .map(|trigger| self.schedule.resolve(trigger))
            .collect();
        for trigger in &resolved {
            if let Err(error) = self.scheduler.register(trigger) {
                self.scheduler.destroy();
                return Err(error.into());
            }
        }
        tracing::debug!(
            schedule = self.schedule.name(),
            triggers = resolved.len(),
            "registered schedule triggers"
        );
        Ok(())
    }

    /// Swap the armed copies of `ids` for ones resolved against the current
    /// arena.
    fn reregister(
        &mut self,
        ids: impl IntoIterator<Item = TriggerId>,
    ) -> Result<(), TimeSwitchError> {
        if !self.is_enabled() {
            return Ok(());
        }
        for id in ids {
            let trigger = self
                .schedule
                .trigger(&id)
                .ok_or_else(|| ScheduleError::TriggerNotFound(id.to_string()))?;
            self.scheduler.unregister(trigger)?;
            self.register(&id)?;
        }
        Ok(())
    }
}
