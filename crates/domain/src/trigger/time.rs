//! Time trigger: fires at a fixed wall-clock time on selected weekdays.

use crate::action::Action;
use crate::error::ValidationError;
use crate::id::TriggerId;
use crate::weekday::Weekdays;

/// Fires every selected weekday at `hour:minute` local time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTrigger {
    id: TriggerId,
    hour: u8,
    minute: u8,
    weekdays: Weekdays,
    action: Action,
}

impl TimeTrigger {
    /// Create a builder for constructing a [`TimeTrigger`].
    #[must_use]
    pub fn builder() -> TimeTriggerBuilder {
        TimeTriggerBuilder::default()
    }

    #[must_use]
    pub fn id(&self) -> &TriggerId {
        &self.id
    }

    #[must_use]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    pub fn minute(&self) -> u8 {
        self.minute
    }

    #[must_use]
    pub fn weekdays(&self) -> &Weekdays {
        &self.weekdays
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    pub(crate) fn action_mut(&mut self) -> &mut Action {
        &mut self.action
    }
}

/// Step-by-step builder for [`TimeTrigger`].
#[derive(Debug, Default)]
pub struct TimeTriggerBuilder {
    id: Option<TriggerId>,
    hour: Option<u8>,
    minute: Option<u8>,
    weekdays: Option<Weekdays>,
    action: Option<Action>,
}

impl TimeTriggerBuilder {
    #[must_use]
    pub fn id(mut self, id: TriggerId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn hour(mut self, hour: u8) -> Self {
        self.hour = Some(hour);
        self
    }

    #[must_use]
    pub fn minute(mut self, minute: u8) -> Self {
        self.minute = Some(minute);
        self
    }

    #[must_use]
    pub fn weekdays(mut self, weekdays: Weekdays) -> Self {
        self.weekdays = Some(weekdays);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Consume the builder, validate, and return a [`TimeTrigger`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a field is missing or `hour`/`minute`
    /// is out of range.
    pub fn build(self) -> Result<TimeTrigger, ValidationError> {
        let id = self.id.ok_or(ValidationError::MissingField("id"))?;
        let hour = self.hour.ok_or(ValidationError::MissingField("hour"))?;
        let minute = self.minute.ok_or(ValidationError::MissingField("minute"))?;
        let weekdays = self
            .weekdays
            .ok_or(ValidationError::MissingField("weekdays"))?;
        let mut action = self.action.ok_or(ValidationError::MissingField("action"))?;
        if hour > 23 {
            return Err(ValidationError::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(ValidationError::MinuteOutOfRange(minute));
        }
        action.stamp_owner(&id);
        Ok(TimeTrigger {
            id,
            hour,
            minute,
            weekdays,
            action,
        })
    }
}
