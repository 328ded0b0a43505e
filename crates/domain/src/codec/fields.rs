//! Field accessors shared by the codecs.
//!
//! `null` is treated the same as an absent field.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::id::StateId;
use crate::time::Timestamp;
use crate::value::StateValue;

pub(crate) const TYPE: &str = "type";

pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> CodecError {
    CodecError::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Read the `type` tag of an envelope.
pub(crate) fn type_tag(json: &Value) -> Result<&str, CodecError> {
    field(json, TYPE)?
        .as_str()
        .ok_or_else(|| invalid(TYPE, "expected a string"))
}

/// Check that the envelope's `type` tag equals `expected`.
pub(crate) fn expect_type(json: &Value, expected: &str) -> Result<(), CodecError> {
    let found = type_tag(json)?;
    if found == expected {
        Ok(())
    } else {
        Err(CodecError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

pub(crate) fn field<'a>(json: &'a Value, name: &str) -> Result<&'a Value, CodecError> {
    match json.get(name) {
        None | Some(Value::Null) => Err(CodecError::MissingField(name.to_string())),
        Some(value) => Ok(value),
    }
}

pub(crate) fn optional<'a>(json: &'a Value, name: &str) -> Option<&'a Value> {
    json.get(name).filter(|value| !value.is_null())
}

pub(crate) fn str_field<'a>(json: &'a Value, name: &str) -> Result<&'a str, CodecError> {
    field(json, name)?
        .as_str()
        .ok_or_else(|| invalid(name, "expected a string"))
}

pub(crate) fn bool_field(json: &Value, name: &str) -> Result<bool, CodecError> {
    field(json, name)?
        .as_bool()
        .ok_or_else(|| invalid(name, "expected a boolean"))
}

pub(crate) fn u8_field(json: &Value, name: &str) -> Result<u8, CodecError> {
    field(json, name)?
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| invalid(name, "expected a small non-negative integer"))
}

pub(crate) fn i32_field(json: &Value, name: &str) -> Result<i32, CodecError> {
    field(json, name)?
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| invalid(name, "expected an integer"))
}

pub(crate) fn array_field<'a>(json: &'a Value, name: &str) -> Result<&'a Vec<Value>, CodecError> {
    field(json, name)?
        .as_array()
        .ok_or_else(|| invalid(name, "expected an array"))
}

/// Parse a string field through [`FromStr`].
pub(crate) fn parsed_field<T>(json: &Value, name: &str) -> Result<T, CodecError>
where
    T: FromStr,
    T::Err: ToString,
{
    str_field(json, name)?
        .parse()
        .map_err(|err: T::Err| invalid(name, err.to_string()))
}

pub(crate) fn state_value_field(json: &Value, name: &str) -> Result<StateValue, CodecError> {
    StateValue::from_json(field(json, name)?)
        .ok_or_else(|| invalid(name, "expected a string, number or boolean"))
}

pub(crate) fn state_ids_field(json: &Value, name: &str) -> Result<Vec<StateId>, CodecError> {
    array_field(json, name)?
        .iter()
        .map(|id| -> Result<StateId, CodecError> {
            let id = id
                .as_str()
                .ok_or_else(|| invalid(name, "expected an array of strings"))?;
            Ok(StateId::new(id)?)
        })
        .collect()
}

pub(crate) fn weekdays_field(json: &Value, name: &str) -> Result<Vec<u8>, CodecError> {
    array_field(json, name)?
        .iter()
        .map(|day| {
            day.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| invalid(name, "expected an array of weekday numbers"))
        })
        .collect()
}

pub(crate) fn timestamp_field(json: &Value, name: &str) -> Result<Timestamp, CodecError> {
    let raw = str_field(json, name)?;
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&chrono::Utc))
        .map_err(|err| invalid(name, err.to_string()))
}

pub(crate) fn format_timestamp(date: Timestamp) -> String {
    date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Start an envelope with its `type` tag.
pub(crate) fn envelope(tag: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(TYPE.to_string(), Value::String(tag.to_string()));
    map
}
