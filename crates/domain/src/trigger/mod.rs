//! Trigger: the timing rule that fires an action.

mod astro;
mod one_time;
mod time;

pub use astro::{AstroTime, AstroTrigger, AstroTriggerBuilder, MAX_SHIFT_IN_MINUTES};
pub use one_time::{OneTimeTrigger, OneTimeTriggerBuilder};
pub use time::{TimeTrigger, TimeTriggerBuilder};

use std::fmt;

use crate::action::Action;
use crate::id::TriggerId;
use crate::weekday::Weekdays;

/// Concrete trigger kind, used to route triggers to their scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerType {
    Time,
    Astro,
    OneTime,
}

impl TriggerType {
    /// Stable type tag used on the wire and by the codec registry.
    #[must_use]
    pub fn type_tag(self) -> &'static str {
        match self {
            Self::Time => Trigger::TIME,
            Self::Astro => Trigger::ASTRO,
            Self::OneTime => Trigger::ONE_TIME,
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

/// A timing rule owning the action it fires.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Time(TimeTrigger),
    Astro(AstroTrigger),
    OneTime(OneTimeTrigger),
}

impl Trigger {
    pub const TIME: &'static str = "TimeTrigger";
    pub const ASTRO: &'static str = "AstroTrigger";
    pub const ONE_TIME: &'static str = "OneTimeTrigger";

    #[must_use]
    pub fn id(&self) -> &TriggerId {
        match self {
            Self::Time(t) => t.id(),
            Self::Astro(t) => t.id(),
            Self::OneTime(t) => t.id(),
        }
    }

    #[must_use]
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            Self::Time(_) => TriggerType::Time,
            Self::Astro(_) => TriggerType::Astro,
            Self::OneTime(_) => TriggerType::OneTime,
        }
    }

    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        self.trigger_type().type_tag()
    }

    /// Days this trigger may fire on. One-time triggers report every day.
    #[must_use]
    pub fn weekdays(&self) -> Weekdays {
        match self {
            Self::Time(t) => t.weekdays().clone(),
            Self::Astro(t) => t.weekdays().clone(),
            Self::OneTime(_) => Weekdays::all(),
        }
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        match self {
            Self::Time(t) => t.action(),
            Self::Astro(t) => t.action(),
            Self::OneTime(t) => t.action(),
        }
    }

    /// Mutable access to the action, for in-place rebinding.
    pub fn action_mut(&mut self) -> &mut Action {
        match self {
            Self::Time(t) => t.action_mut(),
            Self::Astro(t) => t.action_mut(),
            Self::OneTime(t) => t.action_mut(),
        }
    }

    /// Swap the action, stamping this trigger as its owner.
    pub fn set_action(&mut self, mut action: Action) {
        action.stamp_owner(self.id());
        *self.action_mut() = action;
    }

    /// Copy of this trigger with every shared action reference resolved.
    #[must_use]
    pub fn resolved(&self, arena: &crate::action::OnOffActions) -> Self {
        let mut copy = self.clone();
        let action = copy.action().resolve(arena);
        *copy.action_mut() = action;
        copy
    }
}

impl From<TimeTrigger> for Trigger {
    fn from(trigger: TimeTrigger) -> Self {
        Self::Time(trigger)
    }
}

impl From<AstroTrigger> for Trigger {
    fn from(trigger: AstroTrigger) -> Self {
        Self::Astro(trigger)
    }
}

impl From<OneTimeTrigger> for Trigger {
    fn from(trigger: OneTimeTrigger) -> Self {
        Self::OneTime(trigger)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time(t) => write!(f, "time({}, {:02}:{:02})", t.id(), t.hour(), t.minute()),
            Self::Astro(t) => write!(
                f,
                "astro({}, {} {:+}min)",
                t.id(),
                t.astro_time(),
                t.shift_in_minutes()
            ),
            Self::OneTime(t) => write!(f, "one_time({}, {})", t.id(), t.date().to_rfc3339()),
        }
    }
}
