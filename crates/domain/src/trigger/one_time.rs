//! One-time trigger: fires once at an absolute instant.

use crate::action::Action;
use crate::error::ValidationError;
use crate::id::TriggerId;
use crate::time::Timestamp;

/// Fires once at `date`. The scheduler destroys it after it fired, or right
/// away (after a grace delay) when `date` is already past.
#[derive(Debug, Clone, PartialEq)]
pub struct OneTimeTrigger {
    id: TriggerId,
    date: Timestamp,
    action: Action,
}

impl OneTimeTrigger {
    /// Create a builder for constructing a [`OneTimeTrigger`].
    #[must_use]
    pub fn builder() -> OneTimeTriggerBuilder {
        OneTimeTriggerBuilder::default()
    }

    #[must_use]
    pub fn id(&self) -> &TriggerId {
        &self.id
    }

    #[must_use]
    pub fn date(&self) -> Timestamp {
        self.date
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Whether `date` lies before `now`.
    #[must_use]
    pub fn is_past(&self, now: Timestamp) -> bool {
        self.date < now
    }

    pub(crate) fn action_mut(&mut self) -> &mut Action {
        &mut self.action
    }
}

/// Step-by-step builder for [`OneTimeTrigger`].
#[derive(Debug, Default)]
pub struct OneTimeTriggerBuilder {
    id: Option<TriggerId>,
    date: Option<Timestamp>,
    action: Option<Action>,
}

impl OneTimeTriggerBuilder {
    #[must_use]
    pub fn id(mut self, id: TriggerId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn date(mut self, date: Timestamp) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Consume the builder, validate, and return a [`OneTimeTrigger`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] if a field is missing.
    pub fn build(self) -> Result<OneTimeTrigger, ValidationError> {
        let id = self.id.ok_or(ValidationError::MissingField("id"))?;
        let date = self.date.ok_or(ValidationError::MissingField("date"))?;
        let mut action = self.action.ok_or(ValidationError::MissingField("action"))?;
        action.stamp_owner(&id);
        Ok(OneTimeTrigger { id, date, action })
    }
}
