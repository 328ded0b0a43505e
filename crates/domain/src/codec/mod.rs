//! Codec registry: converts domain values to and from JSON envelopes.
//!
//! Every envelope carries a `type` tag. A [`Registry`] holds one
//! [`CodecTable`] per family (triggers, actions, conditions) keyed by that
//! tag. Codecs receive the registry so nested values (a trigger's action, a
//! condition action's condition) go through the same tables.
//!
//! Schedules are (de)serialized on a scoped copy of the registry where the
//! on/off action codec is wrapped by an [`ActionReferenceCodec`], so triggers
//! pointing at the schedule's canonical actions are written as references.

mod action;
mod condition;
pub(crate) mod fields;
mod schedule;
mod trigger;

pub use action::{
    ActionReferenceCodec, ConditionActionCodec, OnOffStateActionCodec, SetStateValueActionCodec,
};
pub use condition::{StringStateAndConstantConditionCodec, StringStateAndStateConditionCodec};
pub use trigger::{AstroTriggerCodec, OneTimeTriggerCodec, TimeTriggerCodec};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::action::Action;
use crate::condition::Condition;
use crate::error::CodecError;
use crate::trigger::Trigger;

/// Converts one variant of a family `T` to and from JSON.
pub trait Codec<T>: Send + Sync {
    /// Tag written to and matched against the envelope's `type` field.
    fn type_tag(&self) -> &'static str;

    /// Serialize `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TypeMismatch`] when `value` is another variant.
    fn serialize(&self, value: &T, registry: &Registry) -> Result<Value, CodecError>;

    /// Deserialize an envelope carrying this codec's tag.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] for a missing or mismatched tag, missing or
    /// wrongly typed fields, and values failing domain validation.
    fn deserialize(&self, json: &Value, registry: &Registry) -> Result<T, CodecError>;
}

/// Dispatch table of codecs for one family, keyed by type tag.
pub struct CodecTable<T> {
    codecs: HashMap<&'static str, Arc<dyn Codec<T>>>,
}

impl<T> CodecTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register `codec` under its tag, overwriting any previous one.
    pub fn use_codec(&mut self, codec: Arc<dyn Codec<T>>) {
        self.codecs.insert(codec.type_tag(), codec);
    }

    /// Swap the codec registered under `codec`'s tag and return the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NoCodecFound`] when nothing is registered for the tag.
    pub fn replace_codec(&mut self, codec: Arc<dyn Codec<T>>) -> Result<Arc<dyn Codec<T>>, CodecError> {
        let tag = codec.type_tag();
        match self.codecs.get_mut(tag) {
            Some(slot) => Ok(std::mem::replace(slot, codec)),
            None => Err(CodecError::NoCodecFound(tag.to_string())),
        }
    }

    /// Look up the codec for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NoCodecFound`] when nothing is registered.
    pub fn get(&self, tag: &str) -> Result<&Arc<dyn Codec<T>>, CodecError> {
        self.codecs
            .get(tag)
            .ok_or_else(|| CodecError::NoCodecFound(tag.to_string()))
    }

    fn serialize(&self, tag: &str, value: &T, registry: &Registry) -> Result<Value, CodecError> {
        self.get(tag)?.serialize(value, registry)
    }

    fn deserialize(&self, json: &Value, registry: &Registry) -> Result<T, CodecError> {
        let tag = fields::type_tag(json)?;
        self.get(tag)?.deserialize(json, registry)
    }
}

impl<T> Default for CodecTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CodecTable<T> {
    fn clone(&self) -> Self {
        Self {
            codecs: self.codecs.clone(),
        }
    }
}

impl<T> fmt::Debug for CodecTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.codecs.keys().collect();
        tags.sort_unstable();
        f.debug_struct("CodecTable").field("tags", &tags).finish()
    }
}

/// The codec tables for every family.
///
/// [`Registry::default`] registers a codec for every built-in variant.
/// Cloning is cheap; codecs are shared behind [`Arc`].
#[derive(Debug, Clone)]
pub struct Registry {
    triggers: CodecTable<Trigger>,
    actions: CodecTable<Action>,
    conditions: CodecTable<Condition>,
}

impl Registry {
    /// A registry with no codec at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            triggers: CodecTable::new(),
            actions: CodecTable::new(),
            conditions: CodecTable::new(),
        }
    }

    #[must_use]
    pub fn triggers(&self) -> &CodecTable<Trigger> {
        &self.triggers
    }

    pub fn triggers_mut(&mut self) -> &mut CodecTable<Trigger> {
        &mut self.triggers
    }

    #[must_use]
    pub fn actions(&self) -> &CodecTable<Action> {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut CodecTable<Action> {
        &mut self.actions
    }

    #[must_use]
    pub fn conditions(&self) -> &CodecTable<Condition> {
        &self.conditions
    }

    pub fn conditions_mut(&mut self) -> &mut CodecTable<Condition> {
        &mut self.conditions
    }

    /// Copy of this registry whose on/off action codec understands
    /// `{"type":"OnOffStateAction","name":"On"|"Off"}` references.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NoCodecFound`] when no on/off action codec is
    /// registered to wrap.
    pub fn with_action_references(&self) -> Result<Self, CodecError> {
        let mut scoped = self.clone();
        let inner = scoped.actions.get(Action::ON_OFF_STATE)?.clone();
        scoped
            .actions
            .replace_codec(Arc::new(ActionReferenceCodec::new(inner)))?;
        Ok(scoped)
    }

    /// # Errors
    ///
    /// Returns [`CodecError`] when no codec handles the value or a nested value.
    pub fn serialize_trigger(&self, trigger: &Trigger) -> Result<Value, CodecError> {
        self.triggers.serialize(trigger.type_tag(), trigger, self)
    }

    /// # Errors
    ///
    /// Returns [`CodecError`] when the envelope cannot be decoded.
    pub fn deserialize_trigger(&self, json: &Value) -> Result<Trigger, CodecError> {
        self.triggers.deserialize(json, self)
    }

    /// # Errors
    ///
    /// Returns [`CodecError`] when no codec handles the value or a nested value.
    pub fn serialize_action(&self, action: &Action) -> Result<Value, CodecError> {
        self.actions.serialize(action.type_tag(), action, self)
    }

    /// # Errors
    ///
    /// Returns [`CodecError`] when the envelope cannot be decoded.
    pub fn deserialize_action(&self, json: &Value) -> Result<Action, CodecError> {
        self.actions.deserialize(json, self)
    }

    /// # Errors
    ///
    /// Returns [`CodecError::NoCodecFound`] when no codec handles the value.
    pub fn serialize_condition(&self, condition: &Condition) -> Result<Value, CodecError> {
        self.conditions
            .serialize(condition.type_tag(), condition, self)
    }

    /// # Errors
    ///
    /// Returns [`CodecError`] when the envelope cannot be decoded.
    pub fn deserialize_condition(&self, json: &Value) -> Result<Condition, CodecError> {
        self.conditions.deserialize(json, self)
    }

    /// # Errors
    ///
    /// See [`Registry::serialize_trigger`].
    pub fn serialize_trigger_to_string(&self, trigger: &Trigger) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.serialize_trigger(trigger)?)?)
    }

    /// # Errors
    ///
    /// Returns [`CodecError::Json`] for malformed JSON, otherwise see
    /// [`Registry::deserialize_trigger`].
    pub fn deserialize_trigger_from_str(&self, raw: &str) -> Result<Trigger, CodecError> {
        self.deserialize_trigger(&serde_json::from_str(raw)?)
    }

    /// # Errors
    ///
    /// See [`Registry::serialize_action`].
    pub fn serialize_action_to_string(&self, action: &Action) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.serialize_action(action)?)?)
    }

    /// # Errors
    ///
    /// Returns [`CodecError::Json`] for malformed JSON, otherwise see
    /// [`Registry::deserialize_action`].
    pub fn deserialize_action_from_str(&self, raw: &str) -> Result<Action, CodecError> {
        self.deserialize_action(&serde_json::from_str(raw)?)
    }

    /// # Errors
    ///
    /// See [`Registry::serialize_condition`].
    pub fn serialize_condition_to_string(&self, condition: &Condition) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.serialize_condition(condition)?)?)
    }

    /// # Errors
    ///
    /// Returns [`CodecError::Json`] for malformed JSON, otherwise see
    /// [`Registry::deserialize_condition`].
    pub fn deserialize_condition_from_str(&self, raw: &str) -> Result<Condition, CodecError> {
        self.deserialize_condition(&serde_json::from_str(raw)?)
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.triggers.use_codec(Arc::new(TimeTriggerCodec));
        registry.triggers.use_codec(Arc::new(AstroTriggerCodec));
        registry.triggers.use_codec(Arc::new(OneTimeTriggerCodec));
        registry.actions.use_codec(Arc::new(OnOffStateActionCodec));
        registry.actions.use_codec(Arc::new(ConditionActionCodec));
        registry.actions.use_codec(Arc::new(SetStateValueActionCodec));
        registry
            .conditions
            .use_codec(Arc::new(StringStateAndConstantConditionCodec));
        registry
            .conditions
            .use_codec(Arc::new(StringStateAndStateConditionCodec));
        registry
    }
}
