//! On/off state action: writes one of two values to a list of states.

use crate::error::ValidationError;
use crate::id::StateId;
use crate::value::{StateValue, ValueType};

/// Writes either `on_value` or `off_value` (selected by `boolean_value`) to
/// every state in `ids_of_states_to_set`.
#[derive(Debug, Clone, PartialEq)]
pub struct OnOffStateAction {
    value_type: ValueType,
    ids_of_states_to_set: Vec<StateId>,
    on_value: StateValue,
    off_value: StateValue,
    boolean_value: bool,
}

impl OnOffStateAction {
    /// Create a builder for constructing an [`OnOffStateAction`].
    #[must_use]
    pub fn builder() -> OnOffStateActionBuilder {
        OnOffStateActionBuilder::default()
    }

    /// Build the canonical on/off pair sharing value type, values and targets.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the values do not match `value_type` or
    /// `ids` is empty.
    pub fn pair(
        value_type: ValueType,
        ids: Vec<StateId>,
        on_value: StateValue,
        off_value: StateValue,
    ) -> Result<(Self, Self), ValidationError> {
        let on = Self::builder()
            .value_type(value_type)
            .state_ids(ids.clone())
            .on_value(on_value.clone())
            .off_value(off_value.clone())
            .boolean_value(true)
            .build()?;
        let off = Self::builder()
            .value_type(value_type)
            .state_ids(ids)
            .on_value(on_value)
            .off_value(off_value)
            .boolean_value(false)
            .build()?;
        Ok((on, off))
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub fn ids_of_states_to_set(&self) -> &[StateId] {
        &self.ids_of_states_to_set
    }

    #[must_use]
    pub fn on_value(&self) -> &StateValue {
        &self.on_value
    }

    #[must_use]
    pub fn off_value(&self) -> &StateValue {
        &self.off_value
    }

    #[must_use]
    pub fn boolean_value(&self) -> bool {
        self.boolean_value
    }

    /// The value this action writes: `on_value` when `boolean_value` is set.
    #[must_use]
    pub fn value_to_set(&self) -> &StateValue {
        if self.boolean_value {
            &self.on_value
        } else {
            &self.off_value
        }
    }

    /// Replace the target states.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoStatesToSet`] when `ids` is empty.
    pub fn set_ids_of_states_to_set(&mut self, ids: Vec<StateId>) -> Result<(), ValidationError> {
        if ids.is_empty() {
            return Err(ValidationError::NoStatesToSet);
        }
        self.ids_of_states_to_set = ids;
        Ok(())
    }
}

/// Step-by-step builder for [`OnOffStateAction`].
#[derive(Debug, Default)]
pub struct OnOffStateActionBuilder {
    value_type: Option<ValueType>,
    ids: Vec<StateId>,
    on_value: Option<StateValue>,
    off_value: Option<StateValue>,
    boolean_value: Option<bool>,
}

impl OnOffStateActionBuilder {
    /// Explicit value type. When omitted it is inferred from `on_value`.
    #[must_use]
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    #[must_use]
    pub fn state_id(mut self, id: StateId) -> Self {
        self.ids.push(id);
        self
    }

    #[must_use]
    pub fn state_ids(mut self, ids: impl IntoIterator<Item = StateId>) -> Self {
        self.ids.extend(ids);
        self
    }

    #[must_use]
    pub fn on_value(mut self, value: impl Into<StateValue>) -> Self {
        self.on_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn off_value(mut self, value: impl Into<StateValue>) -> Self {
        self.off_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn boolean_value(mut self, value: bool) -> Self {
        self.boolean_value = Some(value);
        self
    }

    /// Consume the builder, validate, and return an [`OnOffStateAction`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a field is missing, no target state was
    /// given, or a value does not match the value type.
    pub fn build(self) -> Result<OnOffStateAction, ValidationError> {
        let on_value = self.on_value.ok_or(ValidationError::MissingField("onValue"))?;
        let off_value = self
            .off_value
            .ok_or(ValidationError::MissingField("offValue"))?;
        let boolean_value = self
            .boolean_value
            .ok_or(ValidationError::MissingField("booleanValue"))?;
        if self.ids.is_empty() {
            return Err(ValidationError::NoStatesToSet);
        }
        let value_type = self.value_type.unwrap_or_else(|| on_value.value_type());
        for value in [&on_value, &off_value] {
            if !value_type.matches(value) {
                return Err(ValidationError::ValueTypeMismatch {
                    expected: value_type,
                    value: value.to_string(),
                });
            }
        }
        Ok(OnOffStateAction {
            value_type,
            ids_of_states_to_set: self.ids,
            on_value,
            off_value,
            boolean_value,
        })
    }
}
