use serde_json::{Map, Value};

use super::fields::{
    envelope, expect_type, field, format_timestamp, i32_field, optional, parsed_field,
    timestamp_field, u8_field, weekdays_field,
};
use super::{Codec, Registry};
use crate::error::CodecError;
use crate::id::TriggerId;
use crate::trigger::{AstroTime, AstroTrigger, OneTimeTrigger, TimeTrigger, Trigger};
use crate::weekday::Weekdays;

fn mismatch(expected: &str, found: &Trigger) -> CodecError {
    CodecError::TypeMismatch {
        expected: expected.to_string(),
        found: found.type_tag().to_string(),
    }
}

fn weekdays_json(weekdays: &Weekdays) -> Value {
    weekdays.as_slice().iter().copied().map(Value::from).collect()
}

fn head(tag: &str, id: &TriggerId) -> Map<String, Value> {
    let mut map = envelope(tag);
    map.insert("id".into(), id.as_str().into());
    map
}

/// `{"type":"TimeTrigger","id","hour","minute","weekdays","action"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeTriggerCodec;

impl Codec<Trigger> for TimeTriggerCodec {
    fn type_tag(&self) -> &'static str {
        Trigger::TIME
    }

    fn serialize(&self, value: &Trigger, registry: &Registry) -> Result<Value, CodecError> {
        let Trigger::Time(trigger) = value else {
            return Err(mismatch(self.type_tag(), value));
        };
        let mut map = head(self.type_tag(), trigger.id());
        map.insert("hour".into(), trigger.hour().into());
        map.insert("minute".into(), trigger.minute().into());
        map.insert("weekdays".into(), weekdays_json(trigger.weekdays()));
        map.insert("action".into(), registry.serialize_action(trigger.action())?);
        Ok(Value::Object(map))
    }

    fn deserialize(&self, json: &Value, registry: &Registry) -> Result<Trigger, CodecError> {
        expect_type(json, self.type_tag())?;
        let trigger = TimeTrigger::builder()
            .id(parsed_field(json, "id")?)
            .hour(u8_field(json, "hour")?)
            .minute(u8_field(json, "minute")?)
            .weekdays(Weekdays::new(weekdays_field(json, "weekdays")?)?)
            .action(registry.deserialize_action(field(json, "action")?)?)
            .build()?;
        Ok(trigger.into())
    }
}

/// `{"type":"AstroTrigger","id","astroTime","shiftInMinutes","weekdays","action"}`
///
/// A missing `shiftInMinutes` reads as `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AstroTriggerCodec;

impl Codec<Trigger> for AstroTriggerCodec {
    fn type_tag(&self) -> &'static str {
        Trigger::ASTRO
    }

    fn serialize(&self, value: &Trigger, registry: &Registry) -> Result<Value, CodecError> {
        let Trigger::Astro(trigger) = value else {
            return Err(mismatch(self.type_tag(), value));
        };
        let mut map = head(self.type_tag(), trigger.id());
        map.insert("astroTime".into(), trigger.astro_time().as_str().into());
        map.insert("shiftInMinutes".into(), trigger.shift_in_minutes().into());
        map.insert("weekdays".into(), weekdays_json(trigger.weekdays()));
        map.insert("action".into(), registry.serialize_action(trigger.action())?);
        Ok(Value::Object(map))
    }

    fn deserialize(&self, json: &Value, registry: &Registry) -> Result<Trigger, CodecError> {
        expect_type(json, self.type_tag())?;
        let shift = match optional(json, "shiftInMinutes") {
            Some(_) => i32_field(json, "shiftInMinutes")?,
            None => 0,
        };
        let trigger = AstroTrigger::builder()
            .id(parsed_field(json, "id")?)
            .astro_time(parsed_field::<AstroTime>(json, "astroTime")?)
            .shift_in_minutes(shift)
            .weekdays(Weekdays::new(weekdays_field(json, "weekdays")?)?)
            .action(registry.deserialize_action(field(json, "action")?)?)
            .build()?;
        Ok(trigger.into())
    }
}

/// `{"type":"OneTimeTrigger","id","date","action"}` with an RFC 3339 `date`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneTimeTriggerCodec;

impl Codec<Trigger> for OneTimeTriggerCodec {
    fn type_tag(&self) -> &'static str {
        Trigger::ONE_TIME
    }

    fn serialize(&self, value: &Trigger, registry: &Registry) -> Result<Value, CodecError> {
        let Trigger::OneTime(trigger) = value else {
            return Err(mismatch(self.type_tag(), value));
        };
        let mut map = head(self.type_tag(), trigger.id());
        map.insert("date".into(), format_timestamp(trigger.date()).into());
        map.insert("action".into(), registry.serialize_action(trigger.action())?);
        Ok(Value::Object(map))
    }

    fn deserialize(&self, json: &Value, registry: &Registry) -> Result<Trigger, CodecError> {
        expect_type(json, self.type_tag())?;
        let trigger = OneTimeTrigger::builder()
            .id(parsed_field(json, "id")?)
            .date(timestamp_field(json, "date")?)
            .action(registry.deserialize_action(field(json, "action")?)?)
            .build()?;
        Ok(trigger.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use serde_json::json;

    fn set_value_action() -> Value {
        json!({
            "type": "SetStateValueAction",
            "idOfStateToSet": "blind.level",
            "valueType": "number",
            "value": 40
        })
    }

    #[test]
    fn should_roundtrip_time_trigger_and_stamp_owner() {
        let registry = Registry::default();
        let raw = json!({
            "type": "TimeTrigger",
            "id": "0",
            "hour": 7,
            "minute": 30,
            "weekdays": [1, 2, 3, 4, 5],
            "action": set_value_action()
        });
        let trigger = registry.deserialize_trigger(&raw).unwrap();
        let json = registry.serialize_trigger(&trigger).unwrap();
        assert_eq!(json["hour"], json!(7));
        assert_eq!(json["weekdays"], json!([1, 2, 3, 4, 5]));
        assert_eq!(json["action"]["trigger"], json!("0"));
    }

    #[test]
    fn should_roundtrip_astro_trigger() {
        let registry = Registry::default();
        let raw = json!({
            "type": "AstroTrigger",
            "id": "1",
            "astroTime": "sunset",
            "shiftInMinutes": -15,
            "weekdays": [0, 6],
            "action": set_value_action()
        });
        let trigger = registry.deserialize_trigger(&raw).unwrap();
        match &trigger {
            Trigger::Astro(t) => {
                assert_eq!(t.astro_time(), AstroTime::Sunset);
                assert_eq!(t.shift_in_minutes(), -15);
            }
            other => panic!("unexpected trigger {other}"),
        }
        let json = registry.serialize_trigger(&trigger).unwrap();
        assert_eq!(json["astroTime"], json!("sunset"));
        assert_eq!(json["shiftInMinutes"], json!(-15));
    }

    #[test]
    fn should_default_missing_shift_to_zero() {
        let registry = Registry::default();
        let trigger = registry
            .deserialize_trigger(&json!({
                "type": "AstroTrigger",
                "id": "1",
                "astroTime": "dawn",
                "weekdays": [3],
                "action": set_value_action()
            }))
            .unwrap();
        assert!(matches!(trigger, Trigger::Astro(t) if t.shift_in_minutes() == 0));
    }

    #[test]
    fn should_reject_shift_out_of_range() {
        let result = Registry::default().deserialize_trigger(&json!({
            "type": "AstroTrigger",
            "id": "1",
            "astroTime": "sunrise",
            "shiftInMinutes": 200,
            "weekdays": [3],
            "action": set_value_action()
        }));
        assert!(matches!(
            result,
            Err(CodecError::Validation(ValidationError::ShiftOutOfRange(200)))
        ));
    }

    #[test]
    fn should_roundtrip_one_time_trigger_date() {
        let registry = Registry::default();
        let raw = json!({
            "type": "OneTimeTrigger",
            "id": "2",
            "date": "2026-10-20T07:00:00.000Z",
            "action": set_value_action()
        });
        let trigger = registry.deserialize_trigger(&raw).unwrap();
        let json = registry.serialize_trigger(&trigger).unwrap();
        assert_eq!(json["date"], json!("2026-10-20T07:00:00.000Z"));
    }

    #[test]
    fn should_reject_duplicate_weekdays() {
        let result = Registry::default().deserialize_trigger(&json!({
            "type": "TimeTrigger",
            "id": "0",
            "hour": 7,
            "minute": 30,
            "weekdays": [1, 1],
            "action": set_value_action()
        }));
        assert!(matches!(
            result,
            Err(CodecError::Validation(ValidationError::DuplicateWeekday(1)))
        ));
    }

    #[test]
    fn should_reject_missing_hour() {
        let result = Registry::default().deserialize_trigger(&json!({
            "type": "TimeTrigger",
            "id": "0",
            "minute": 30,
            "weekdays": [1],
            "action": set_value_action()
        }));
        assert!(matches!(result, Err(CodecError::MissingField(f)) if f == "hour"));
    }

    #[test]
    fn should_reject_type_mismatch_when_codec_called_directly() {
        let result = TimeTriggerCodec.deserialize(
            &json!({"type": "AstroTrigger"}),
            &Registry::default(),
        );
        assert!(matches!(result, Err(CodecError::TypeMismatch { .. })));
    }

    #[test]
    fn should_propagate_nested_action_errors() {
        let result = Registry::default().deserialize_trigger(&json!({
            "type": "TimeTrigger",
            "id": "0",
            "hour": 7,
            "minute": 30,
            "weekdays": [1],
            "action": {"type": "DimAction"}
        }));
        assert!(matches!(result, Err(CodecError::NoCodecFound(t)) if t == "DimAction"));
    }
}
