//! Astro trigger: fires relative to a solar event such as sunrise.

use std::fmt;
use std::str::FromStr;

use crate::action::Action;
use crate::error::ValidationError;
use crate::id::TriggerId;
use crate::weekday::Weekdays;

/// Largest absolute shift, in minutes, allowed relative to the solar event.
pub const MAX_SHIFT_IN_MINUTES: i32 = 120;

/// Named solar events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstroTime {
    Sunrise,
    SunriseEnd,
    GoldenHourEnd,
    SolarNoon,
    GoldenHour,
    SunsetStart,
    Sunset,
    Dusk,
    NauticalDusk,
    Night,
    Nadir,
    NightEnd,
    NauticalDawn,
    Dawn,
}

impl AstroTime {
    pub const ALL: [Self; 14] = [
        Self::Sunrise,
        Self::SunriseEnd,
        Self::GoldenHourEnd,
        Self::SolarNoon,
        Self::GoldenHour,
        Self::SunsetStart,
        Self::Sunset,
        Self::Dusk,
        Self::NauticalDusk,
        Self::Night,
        Self::Nadir,
        Self::NightEnd,
        Self::NauticalDawn,
        Self::Dawn,
    ];

    /// Wire name, as used in `astroTime` fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunrise => "sunrise",
            Self::SunriseEnd => "sunriseEnd",
            Self::GoldenHourEnd => "goldenHourEnd",
            Self::SolarNoon => "solarNoon",
            Self::GoldenHour => "goldenHour",
            Self::SunsetStart => "sunsetStart",
            Self::Sunset => "sunset",
            Self::Dusk => "dusk",
            Self::NauticalDusk => "nauticalDusk",
            Self::Night => "night",
            Self::Nadir => "nadir",
            Self::NightEnd => "nightEnd",
            Self::NauticalDawn => "nauticalDawn",
            Self::Dawn => "dawn",
        }
    }
}

impl fmt::Display for AstroTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AstroTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown astro time `{s}`"))
    }
}

/// Fires on selected weekdays at a solar event shifted by a number of minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct AstroTrigger {
    id: TriggerId,
    astro_time: AstroTime,
    shift_in_minutes: i32,
    weekdays: Weekdays,
    action: Action,
}

impl AstroTrigger {
    /// Create a builder for constructing an [`AstroTrigger`].
    #[must_use]
    pub fn builder() -> AstroTriggerBuilder {
        AstroTriggerBuilder::default()
    }

    #[must_use]
    pub fn id(&self) -> &TriggerId {
        &self.id
    }

    #[must_use]
    pub fn astro_time(&self) -> AstroTime {
        self.astro_time
    }

    #[must_use]
    pub fn shift_in_minutes(&self) -> i32 {
        self.shift_in_minutes
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

/// Step-by-step builder for [`AstroTrigger`].
#[derive(Debug, Default)]
pub struct AstroTriggerBuilder {
    id: Option<TriggerId>,
    astro_time: Option<AstroTime>,
    shift_in_minutes: i32,
    weekdays: Option<Weekdays>,
    action: Option<Action>,
}

impl AstroTriggerBuilder {
    #[must_use]
    pub fn id(mut self, id: TriggerId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn astro_time(mut self, astro_time: AstroTime) -> Self {
        self.astro_time = Some(astro_time);
        self
    }

    /// Defaults to `0` when not called.
    #[must_use]
    pub fn shift_in_minutes(mut self, shift: i32) -> Self {
        self.shift_in_minutes = shift;
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

    /// Consume the builder, validate, and return an [`AstroTrigger`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a field is missing or the shift exceeds
    /// [`MAX_SHIFT_IN_MINUTES`] in either direction.
    pub fn build(self) -> Result<AstroTrigger, ValidationError> {
        let id = self.id.ok_or(ValidationError::MissingField("id"))?;
        let astro_time = self
            .astro_time
            .ok_or(ValidationError::MissingField("astroTime"))?;
        let weekdays = self
            .weekdays
            .ok_or(ValidationError::MissingField("weekdays"))?;
        let mut action = self.action.ok_or(ValidationError::MissingField("action"))?;
        if self.shift_in_minutes.abs() > MAX_SHIFT_IN_MINUTES {
            return Err(ValidationError::ShiftOutOfRange(self.shift_in_minutes));
        }
        action.stamp_owner(&id);
        Ok(AstroTrigger {
            id,
            astro_time,
            shift_in_minutes: self.shift_in_minutes,
            weekdays,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionSlot;

    fn builder(shift: i32) -> AstroTriggerBuilder {
        AstroTrigger::builder()
            .id(TriggerId::new("1").unwrap())
            .astro_time(AstroTime::Sunset)
            .shift_in_minutes(shift)
            .weekdays(Weekdays::all())
            .action(Action::Shared(ActionSlot::Off))
    }

    #[test]
    fn should_accept_shift_at_bounds() {
        assert!(builder(120).build().is_ok());
        assert!(builder(-120).build().is_ok());
    }

    #[test]
    fn should_reject_shift_beyond_bound() {
        assert_eq!(
            builder(121).build(),
            Err(ValidationError::ShiftOutOfRange(121))
        );
        assert_eq!(
            builder(-600).build(),
            Err(ValidationError::ShiftOutOfRange(-600))
        );
    }

    #[test]
    fn should_default_shift_to_zero() {
        let trigger = AstroTrigger::builder()
            .id(TriggerId::new("1").unwrap())
            .astro_time(AstroTime::Sunrise)
            .weekdays(Weekdays::all())
            .action(Action::Shared(ActionSlot::On))
            .build()
            .unwrap();
        assert_eq!(trigger.shift_in_minutes(), 0);
    }

    #[test]
    fn should_parse_every_astro_time_from_its_wire_name() {
        for time in AstroTime::ALL {
            assert_eq!(time.as_str().parse::<AstroTime>(), Ok(time));
        }
        assert!("noon".parse::<AstroTime>().is_err());
    }
}
