use serde_json::Value;

use super::fields::{array_field, envelope, expect_type, field, invalid, str_field};
use super::Registry;
use crate::action::{Action, ActionSlot, OnOffStateAction};
use crate::error::CodecError;
use crate::schedule::OnOffSchedule;

impl Registry {
    /// Serialize a schedule to `{"type":"OnOffSchedule","name","onAction","offAction","triggers"}`.
    ///
    /// Triggers pointing at the canonical actions are written as references.
    /// The enabled flag is not part of the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when a trigger or action cannot be serialized.
    pub fn serialize_schedule(&self, schedule: &OnOffSchedule) -> Result<Value, CodecError> {
        let scoped = self.with_action_references()?;
        let mut map = envelope(OnOffSchedule::TYPE);
        map.insert("name".into(), schedule.name().into());
        map.insert(
            "onAction".into(),
            self.serialize_action(&Action::OnOffState(schedule.on_action().clone()))?,
        );
        map.insert(
            "offAction".into(),
            self.serialize_action(&Action::OnOffState(schedule.off_action().clone()))?,
        );
        let triggers = schedule
            .triggers()
            .iter()
            .map(|trigger| scoped.serialize_trigger(trigger))
            .collect::<Result<Vec<_>, _>>()?;
        map.insert("triggers".into(), Value::Array(triggers));
        Ok(Value::Object(map))
    }

    /// Deserialize a schedule envelope. The result is disabled; the enabled
    /// flag is stored separately.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the envelope or any nested value cannot be
    /// decoded, or trigger ids are not unique.
    pub fn deserialize_schedule(&self, json: &Value) -> Result<OnOffSchedule, CodecError> {
        expect_type(json, OnOffSchedule::TYPE)?;
        let scoped = self.with_action_references()?;
        let on = self.canonical_action(json, "onAction", ActionSlot::On)?;
        let off = self.canonical_action(json, "offAction", ActionSlot::Off)?;
        let triggers = array_field(json, "triggers")?
            .iter()
            .map(|trigger| scoped.deserialize_trigger(trigger))
            .collect::<Result<Vec<_>, _>>()?;

        let mut schedule = OnOffSchedule::new(str_field(json, "name")?, on, off)?;
        for trigger in triggers {
            schedule
                .add_trigger(trigger)
                .map_err(|err| invalid("triggers", err.to_string()))?;
        }
        Ok(schedule)
    }

    /// # Errors
    ///
    /// See [`Registry::serialize_schedule`].
    pub fn serialize_schedule_to_string(&self, schedule: &OnOffSchedule) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.serialize_schedule(schedule)?)?)
    }

    /// # Errors
    ///
    /// Returns [`CodecError::Json`] for malformed JSON, otherwise see
    /// [`Registry::deserialize_schedule`].
    pub fn deserialize_schedule_from_str(&self, raw: &str) -> Result<OnOffSchedule, CodecError> {
        self.deserialize_schedule(&serde_json::from_str(raw)?)
    }

    fn canonical_action(
        &self,
        json: &Value,
        name: &str,
        slot: ActionSlot,
    ) -> Result<OnOffStateAction, CodecError> {
        match self.deserialize_action(field(json, name)?)? {
            Action::OnOffState(action) => Ok(action),
            other => Err(CodecError::TypeMismatch {
                expected: format!("{} in slot {}", Action::ON_OFF_STATE, slot.name()),
                found: other.type_tag().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TriggerId;
    use serde_json::json;

    fn schedule_json() -> Value {
        json!({
            "type": "OnOffSchedule",
            "name": "Porch",
            "onAction": {
                "type": "OnOffStateAction",
                "valueType": "boolean",
                "idsOfStatesToSet": ["porch.light"],
                "onValue": true,
                "offValue": false,
                "booleanValue": true
            },
            "offAction": {
                "type": "OnOffStateAction",
                "valueType": "boolean",
                "idsOfStatesToSet": ["porch.light"],
                "onValue": true,
                "offValue": false,
                "booleanValue": false
            },
            "triggers": [
                {
                    "type": "TimeTrigger",
                    "id": "0",
                    "hour": 19,
                    "minute": 0,
                    "weekdays": [0, 1, 2, 3, 4, 5, 6],
                    "action": {"type": "OnOffStateAction", "name": "On"}
                },
                {
                    "type": "AstroTrigger",
                    "id": "1",
                    "astroTime": "sunrise",
                    "shiftInMinutes": 20,
                    "weekdays": [1, 2, 3, 4, 5],
                    "action": {"type": "OnOffStateAction", "name": "Off"}
                }
            ]
        })
    }

    #[test]
    fn should_resolve_references_to_canonical_actions() {
        let schedule = Registry::default()
            .deserialize_schedule(&schedule_json())
            .unwrap();
        let trigger = schedule.trigger(&TriggerId::new("0").unwrap()).unwrap();
        assert_eq!(trigger.action(), &Action::Shared(ActionSlot::On));
        let resolved = schedule.resolve(trigger);
        assert_eq!(
            resolved.action(),
            &Action::OnOffState(schedule.on_action().clone())
        );
        assert!(!schedule.is_enabled());
    }

    #[test]
    fn should_roundtrip_schedule_envelope() {
        let registry = Registry::default();
        let schedule = registry.deserialize_schedule(&schedule_json()).unwrap();
        assert_eq!(registry.serialize_schedule(&schedule).unwrap(), schedule_json());
    }

    #[test]
    fn should_not_write_enabled_flag() {
        let registry = Registry::default();
        let mut schedule = registry.deserialize_schedule(&schedule_json()).unwrap();
        schedule.set_enabled(true);
        let json = registry.serialize_schedule(&schedule).unwrap();
        assert!(json.get("enabled").is_none());
    }

    #[test]
    fn should_write_rebound_triggers_as_references() {
        let registry = Registry::default();
        let mut raw = schedule_json();
        raw["triggers"][0]["action"] = raw["onAction"].clone();
        let mut schedule = registry.deserialize_schedule(&raw).unwrap();
        assert!(matches!(schedule.triggers()[0].action(), Action::OnOffState(_)));

        let on = schedule.on_action().clone();
        schedule.replace_action(ActionSlot::On, on);

        let json = registry.serialize_schedule(&schedule).unwrap();
        assert_eq!(
            json["triggers"][0]["action"],
            json!({"type": "OnOffStateAction", "name": "On"})
        );
    }

    #[test]
    fn should_reject_unknown_reference_in_schedule() {
        let mut raw = schedule_json();
        raw["triggers"][1]["action"]["name"] = json!("Toggle");
        let result = Registry::default().deserialize_schedule(&raw);
        assert!(matches!(result, Err(CodecError::UnknownReferenceName(n)) if n == "Toggle"));
    }

    #[test]
    fn should_reject_duplicate_trigger_ids() {
        let mut raw = schedule_json();
        raw["triggers"][1]["id"] = json!("0");
        let result = Registry::default().deserialize_schedule(&raw);
        assert!(matches!(
            result,
            Err(CodecError::InvalidField { field, .. }) if field == "triggers"
        ));
    }

    #[test]
    fn should_reject_non_on_off_canonical_action() {
        let mut raw = schedule_json();
        raw["onAction"] = json!({
            "type": "SetStateValueAction",
            "idOfStateToSet": "a",
            "valueType": "string",
            "value": "x"
        });
        let result = Registry::default().deserialize_schedule(&raw);
        assert!(matches!(result, Err(CodecError::TypeMismatch { .. })));
    }

    #[test]
    fn should_reject_wrong_envelope_type() {
        let mut raw = schedule_json();
        raw["type"] = json!("Schedule");
        let result = Registry::default().deserialize_schedule(&raw);
        assert!(matches!(result, Err(CodecError::TypeMismatch { .. })));
    }
}
