//! Writes one fixed value to one state.

use crate::error::ValidationError;
use crate::id::{StateId, TriggerId};
use crate::value::{StateValue, ValueType};

/// Writes `value` to `id_of_state_to_set`.
///
/// `trigger` points back at the owning trigger. It is carried for the wire
/// format only and is stamped whenever the action is attached to a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct SetStateValueAction {
    id_of_state_to_set: StateId,
    value_type: ValueType,
    value: StateValue,
    trigger: Option<TriggerId>,
}

impl SetStateValueAction {
    /// Create an action, checking `value` against `value_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ValueTypeMismatch`] when they disagree.
    pub fn new(
        id_of_state_to_set: StateId,
        value_type: ValueType,
        value: StateValue,
    ) -> Result<Self, ValidationError> {
        if !value_type.matches(&value) {
            return Err(ValidationError::ValueTypeMismatch {
                expected: value_type,
                value: value.to_string(),
            });
        }
        Ok(Self {
            id_of_state_to_set,
            value_type,
            value,
            trigger: None,
        })
    }

    #[must_use]
    pub fn id_of_state_to_set(&self) -> &StateId {
        &self.id_of_state_to_set
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub fn value(&self) -> &StateValue {
        &self.value
    }

    #[must_use]
    pub fn trigger(&self) -> Option<&TriggerId> {
        self.trigger.as_ref()
    }

    pub(crate) fn set_trigger(&mut self, trigger: TriggerId) {
        self.trigger = Some(trigger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_when_value_matches_type() {
        let action = SetStateValueAction::new(
            StateId::new("blind.level").unwrap(),
            ValueType::Number,
            StateValue::Number(40.0),
        )
        .unwrap();
        assert_eq!(action.value(), &StateValue::Number(40.0));
        assert!(action.trigger().is_none());
    }

    #[test]
    fn should_reject_when_value_mismatches_type() {
        let result = SetStateValueAction::new(
            StateId::new("blind.level").unwrap(),
            ValueType::Boolean,
            StateValue::from("up"),
        );
        assert!(result.is_err());
    }
}
