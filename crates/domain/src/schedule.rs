//! Schedule: a named, enable-able list of triggers sharing on/off actions.
//!
//! This type only enforces the data invariants (unique trigger ids, arena
//! propagation). Keeping the scheduler in sync with the enabled flag is the
//! job of the application layer's `ManagedSchedule`.

use crate::action::{Action, ActionSlot, OnOffActions, OnOffStateAction};
use crate::error::{ScheduleError, TimeSwitchError, ValidationError};
use crate::id::{StateId, TriggerId};
use crate::trigger::Trigger;

/// A schedule switching a set of states between an on and an off value.
#[derive(Debug, Clone, PartialEq)]
pub struct OnOffSchedule {
    name: String,
    enabled: bool,
    actions: OnOffActions,
    triggers: Vec<Trigger>,
}

impl OnOffSchedule {
    pub const TYPE: &'static str = "OnOffSchedule";

    /// A disabled schedule without triggers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is empty.
    pub fn new(
        name: impl Into<String>,
        on_action: OnOffStateAction,
        off_action: OnOffStateAction,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name,
            enabled: false,
            actions: OnOffActions::new(on_action, off_action),
            triggers: Vec::new(),
        })
    }

    /// Create a builder for constructing an [`OnOffSchedule`].
    #[must_use]
    pub fn builder() -> OnOffScheduleBuilder {
        OnOffScheduleBuilder::default()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is empty.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.name = name;
        Ok(())
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn actions(&self) -> &OnOffActions {
        &self.actions
    }

    #[must_use]
    pub fn on_action(&self) -> &OnOffStateAction {
        self.actions.get(ActionSlot::On)
    }

    #[must_use]
    pub fn off_action(&self) -> &OnOffStateAction {
        self.actions.get(ActionSlot::Off)
    }

    #[must_use]
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    #[must_use]
    pub fn trigger(&self, id: &TriggerId) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.id() == id)
    }

    /// Append a trigger.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::DuplicateTrigger`] if the id is taken.
    pub fn add_trigger(&mut self, trigger: Trigger) -> Result<(), ScheduleError> {
        if self.trigger(trigger.id()).is_some() {
            return Err(ScheduleError::DuplicateTrigger(trigger.id().to_string()));
        }
        self.triggers.push(trigger);
        Ok(())
    }

    /// Replace the trigger with the same id, keeping its position.
    /// Returns the replaced trigger.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::TriggerNotFound`] if no trigger has that id.
    pub fn update_trigger(&mut self, trigger: Trigger) -> Result<Trigger, ScheduleError> {
        let slot = self
            .triggers
            .iter_mut()
            .find(|t| t.id() == trigger.id())
            .ok_or_else(|| ScheduleError::TriggerNotFound(trigger.id().to_string()))?;
        Ok(std::mem::replace(slot, trigger))
    }

    /// Remove and return the trigger with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::TriggerNotFound`] if no trigger has that id.
    pub fn remove_trigger(&mut self, id: &TriggerId) -> Result<Trigger, ScheduleError> {
        let index = self
            .triggers
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| ScheduleError::TriggerNotFound(id.to_string()))?;
        Ok(self.triggers.remove(index))
    }

    /// Install a new canonical action in `slot` and point every trigger whose
    /// action has the slot's polarity at it. Returns the ids of triggers whose
    /// effective action changed.
    pub fn replace_action(&mut self, slot: ActionSlot, action: OnOffStateAction) -> Vec<TriggerId> {
        self.actions.replace(slot, action);
        self.triggers
            .iter_mut()
            .filter_map(|trigger| {
                let references_slot = references(trigger.action(), slot);
                let rebound = trigger.action_mut().rebind_to_slot(slot);
                (rebound || references_slot).then(|| trigger.id().clone())
            })
            .collect()
    }

    /// Replace the switched states of both canonical actions.
    /// Returns the ids of triggers referencing either of them.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoStatesToSet`] when `ids` is empty; nothing
    /// is changed in that case.
    pub fn set_switched_ids(&mut self, ids: Vec<StateId>) -> Result<Vec<TriggerId>, ValidationError> {
        if ids.is_empty() {
            return Err(ValidationError::NoStatesToSet);
        }
        self.actions
            .get_mut(ActionSlot::On)
            .set_ids_of_states_to_set(ids.clone())?;
        self.actions
            .get_mut(ActionSlot::Off)
            .set_ids_of_states_to_set(ids)?;
        Ok(self
            .triggers
            .iter()
            .filter(|t| t.action().has_shared_reference())
            .map(|t| t.id().clone())
            .collect())
    }

    /// Copy of `trigger` with shared references replaced by this schedule's
    /// canonical actions.
    #[must_use]
    pub fn resolve(&self, trigger: &Trigger) -> Trigger {
        trigger.resolved(&self.actions)
    }

    /// Smallest integer id above every numeric trigger id in use.
    #[must_use]
    pub fn next_trigger_id(&self) -> TriggerId {
        let next = self
            .triggers
            .iter()
            .filter_map(|t| t.id().as_str().parse::<u64>().ok())
            .max()
            .map_or(0, |max| max + 1);
        TriggerId::from(next)
    }
}

fn references(action: &Action, slot: ActionSlot) -> bool {
    match action {
        Action::Shared(current) => *current == slot,
        Action::Condition(inner) => references(inner.action(), slot),
        Action::OnOffState(_) | Action::SetStateValue(_) => false,
    }
}

/// Step-by-step builder for [`OnOffSchedule`].
#[derive(Debug, Default)]
pub struct OnOffScheduleBuilder {
    name: Option<String>,
    enabled: bool,
    on_action: Option<OnOffStateAction>,
    off_action: Option<OnOffStateAction>,
    triggers: Vec<Trigger>,
}

impl OnOffScheduleBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Defaults to disabled.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn on_action(mut self, action: OnOffStateAction) -> Self {
        self.on_action = Some(action);
        self
    }

    #[must_use]
    pub fn off_action(mut self, action: OnOffStateAction) -> Self {
        self.off_action = Some(action);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Consume the builder, validate, and return an [`OnOffSchedule`].
    ///
    /// # Errors
    ///
    /// Returns [`TimeSwitchError::Validation`] for a missing or empty name or
    /// missing actions, and [`TimeSwitchError::Schedule`] for duplicate
    /// trigger ids.
    pub fn build(self) -> Result<OnOffSchedule, TimeSwitchError> {
        let name = self.name.ok_or(ValidationError::MissingField("name"))?;
        let on = self
            .on_action
            .ok_or(ValidationError::MissingField("onAction"))?;
        let off = self
            .off_action
            .ok_or(ValidationError::MissingField("offAction"))?;
        let mut schedule = OnOffSchedule::new(name, on, off)?;
        schedule.enabled = self.enabled;
        for trigger in self.triggers {
            schedule.add_trigger(trigger)?;
        }
        Ok(schedule)
    }
}
