use std::sync::Arc;

use serde_json::Value;

use super::fields::{
    bool_field, envelope, expect_type, field, invalid, optional, parsed_field, state_ids_field,
    state_value_field, str_field,
};
use super::{Codec, Registry};
use crate::action::{Action, ActionSlot, ConditionAction, OnOffStateAction, SetStateValueAction};
use crate::error::CodecError;
use crate::id::{StateId, TriggerId};
use crate::value::ValueType;

fn mismatch(expected: &str, found: &Action) -> CodecError {
    CodecError::TypeMismatch {
        expected: expected.to_string(),
        found: found.type_tag().to_string(),
    }
}

/// Full on/off action envelope.
///
/// A shared reference cannot be written by this codec: outside a schedule
/// there is no arena to point into.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnOffStateActionCodec;

impl Codec<Action> for OnOffStateActionCodec {
    fn type_tag(&self) -> &'static str {
        Action::ON_OFF_STATE
    }

    fn serialize(&self, value: &Action, _: &Registry) -> Result<Value, CodecError> {
        let action = match value {
            Action::OnOffState(action) => action,
            Action::Shared(slot) => {
                return Err(CodecError::UnknownReferenceName(slot.name().to_string()));
            }
            other => return Err(mismatch(self.type_tag(), other)),
        };
        let mut map = envelope(self.type_tag());
        map.insert("valueType".into(), action.value_type().as_str().into());
        map.insert(
            "idsOfStatesToSet".into(),
            action
                .ids_of_states_to_set()
                .iter()
                .map(|id| Value::from(id.as_str()))
                .collect(),
        );
        map.insert("onValue".into(), action.on_value().to_json());
        map.insert("offValue".into(), action.off_value().to_json());
        map.insert("booleanValue".into(), action.boolean_value().into());
        Ok(Value::Object(map))
    }

    fn deserialize(&self, json: &Value, _: &Registry) -> Result<Action, CodecError> {
        expect_type(json, self.type_tag())?;
        let action = OnOffStateAction::builder()
            .value_type(parsed_field::<ValueType>(json, "valueType")?)
            .state_ids(state_ids_field(json, "idsOfStatesToSet")?)
            .on_value(state_value_field(json, "onValue")?)
            .off_value(state_value_field(json, "offValue")?)
            .boolean_value(bool_field(json, "booleanValue")?)
            .build()?;
        Ok(action.into())
    }
}

/// `{"type":"ConditionAction","condition":{…},"action":{…}}`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionActionCodec;

impl Codec<Action> for ConditionActionCodec {
    fn type_tag(&self) -> &'static str {
        Action::CONDITION
    }

    fn serialize(&self, value: &Action, registry: &Registry) -> Result<Value, CodecError> {
        let Action::Condition(action) = value else {
            return Err(mismatch(self.type_tag(), value));
        };
        let mut map = envelope(self.type_tag());
        map.insert(
            "condition".into(),
            registry.serialize_condition(action.condition())?,
        );
        map.insert("action".into(), registry.serialize_action(action.action())?);
        Ok(Value::Object(map))
    }

    fn deserialize(&self, json: &Value, registry: &Registry) -> Result<Action, CodecError> {
        expect_type(json, self.type_tag())?;
        let condition = registry.deserialize_condition(field(json, "condition")?)?;
        let action = registry.deserialize_action(field(json, "action")?)?;
        Ok(ConditionAction::new(condition, action).into())
    }
}

/// `{"type":"SetStateValueAction","idOfStateToSet","valueType","value","trigger"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct SetStateValueActionCodec;

impl Codec<Action> for SetStateValueActionCodec {
    fn type_tag(&self) -> &'static str {
        Action::SET_STATE_VALUE
    }

    fn serialize(&self, value: &Action, _: &Registry) -> Result<Value, CodecError> {
        let Action::SetStateValue(action) = value else {
            return Err(mismatch(self.type_tag(), value));
        };
        let mut map = envelope(self.type_tag());
        map.insert(
            "idOfStateToSet".into(),
            action.id_of_state_to_set().as_str().into(),
        );
        map.insert("valueType".into(), action.value_type().as_str().into());
        map.insert("value".into(), action.value().to_json());
        if let Some(trigger) = action.trigger() {
            map.insert("trigger".into(), trigger.as_str().into());
        }
        Ok(Value::Object(map))
    }

    fn deserialize(&self, json: &Value, _: &Registry) -> Result<Action, CodecError> {
        expect_type(json, self.type_tag())?;
        let mut action = SetStateValueAction::new(
            parsed_field::<StateId>(json, "idOfStateToSet")?,
            parsed_field::<ValueType>(json, "valueType")?,
            state_value_field(json, "value")?,
        )?;
        if let Some(trigger) = optional(json, "trigger") {
            let trigger = trigger
                .as_str()
                .ok_or_else(|| invalid("trigger", "expected a string"))?;
            action.set_trigger(TriggerId::new(trigger)?);
        }
        Ok(action.into())
    }
}

/// Wraps the on/off action codec so shared references survive a round trip.
///
/// [`Action::Shared`] is written as `{"type":"OnOffStateAction","name":"On"}`
/// and read back to the same slot. Envelopes without `name` and inline
/// actions go through the wrapped codec.
#[derive(Clone)]
pub struct ActionReferenceCodec {
    inner: Arc<dyn Codec<Action>>,
}

impl ActionReferenceCodec {
    #[must_use]
    pub fn new(inner: Arc<dyn Codec<Action>>) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for ActionReferenceCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionReferenceCodec")
            .field("inner", &self.inner.type_tag())
            .finish()
    }
}

impl Codec<Action> for ActionReferenceCodec {
    fn type_tag(&self) -> &'static str {
        Action::ON_OFF_STATE
    }

    fn serialize(&self, value: &Action, registry: &Registry) -> Result<Value, CodecError> {
        match value {
            Action::Shared(slot) => {
                let mut map = envelope(self.type_tag());
                map.insert("name".into(), slot.name().into());
                Ok(Value::Object(map))
            }
            other => self.inner.serialize(other, registry),
        }
    }

    fn deserialize(&self, json: &Value, registry: &Registry) -> Result<Action, CodecError> {
        expect_type(json, self.type_tag())?;
        if optional(json, "name").is_none() {
            return self.inner.deserialize(json, registry);
        }
        let name = str_field(json, "name")?;
        ActionSlot::from_name(name)
            .map(Action::Shared)
            .ok_or_else(|| CodecError::UnknownReferenceName(name.to_string()))
    }
}
