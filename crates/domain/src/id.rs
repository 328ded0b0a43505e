//! Typed identifier newtypes backed by non-empty strings.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Wrap a string, rejecting the empty string.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::EmptyId`] when `value` is empty.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(ValidationError::EmptyId);
                }
                Ok(Self(value))
            }

            /// Borrow the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a [`Trigger`](crate::trigger::Trigger), unique within its schedule.
    TriggerId
);

define_id!(
    /// Identifier of an external state (e.g. `hue.0.porch.on`).
    StateId
);

impl TriggerId {
    /// Id of the form `<prefix>:<suffix>`, used for internally created triggers.
    #[must_use]
    pub fn derived(prefix: &str, suffix: impl fmt::Display) -> Self {
        Self(format!("{prefix}:{suffix}"))
    }
}

impl From<u64> for TriggerId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_derived_trigger_id() {
        let base = TriggerId::new("4").unwrap();
        let id = TriggerId::derived("TimeTriggerForAstroTrigger", &base);
        assert_eq!(id.as_str(), "TimeTriggerForAstroTrigger:4");
        assert_eq!(TriggerId::from(12).as_str(), "12");
    }

    #[test]
    fn should_reject_empty_id() {
        assert_eq!(TriggerId::new(""), Err(ValidationError::EmptyId));
    }

    #[test]
    fn should_roundtrip_through_display_and_from_str() {
        let id = StateId::new("hue.0.porch.on").unwrap();
        let parsed: StateId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_expose_inner_string() {
        let id = TriggerId::new("3").unwrap();
        assert_eq!(id.as_str(), "3");
    }
}
