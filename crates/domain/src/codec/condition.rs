use serde_json::Value;

use super::fields::{envelope, expect_type, parsed_field, str_field};
use super::{Codec, Registry};
use crate::condition::Condition;
use crate::error::CodecError;

fn mismatch(expected: &str, found: &Condition) -> CodecError {
    CodecError::TypeMismatch {
        expected: expected.to_string(),
        found: found.type_tag().to_string(),
    }
}

/// `{"type":"StringStateAndConstantCondition","stateId","constant","sign"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct StringStateAndConstantConditionCodec;

impl Codec<Condition> for StringStateAndConstantConditionCodec {
    fn type_tag(&self) -> &'static str {
        Condition::STRING_STATE_AND_CONSTANT
    }

    fn serialize(&self, value: &Condition, _: &Registry) -> Result<Value, CodecError> {
        let Condition::StringStateAndConstant {
            state_id,
            constant,
            sign,
        } = value
        else {
            return Err(mismatch(self.type_tag(), value));
        };
        let mut map = envelope(self.type_tag());
        map.insert("stateId".into(), state_id.as_str().into());
        map.insert("constant".into(), constant.as_str().into());
        map.insert("sign".into(), sign.as_str().into());
        Ok(Value::Object(map))
    }

    fn deserialize(&self, json: &Value, _: &Registry) -> Result<Condition, CodecError> {
        expect_type(json, self.type_tag())?;
        Ok(Condition::StringStateAndConstant {
            state_id: parsed_field(json, "stateId")?,
            constant: str_field(json, "constant")?.to_string(),
            sign: parsed_field(json, "sign")?,
        })
    }
}

/// `{"type":"StringStateAndStateCondition","stateId1","stateId2","sign"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct StringStateAndStateConditionCodec;

impl Codec<Condition> for StringStateAndStateConditionCodec {
    fn type_tag(&self) -> &'static str {
        Condition::STRING_STATE_AND_STATE
    }

    fn serialize(&self, value: &Condition, _: &Registry) -> Result<Value, CodecError> {
        let Condition::StringStateAndState {
            state_id1,
            state_id2,
            sign,
        } = value
        else {
            return Err(mismatch(self.type_tag(), value));
        };
        let mut map = envelope(self.type_tag());
        map.insert("stateId1".into(), state_id1.as_str().into());
        map.insert("stateId2".into(), state_id2.as_str().into());
        map.insert("sign".into(), sign.as_str().into());
        Ok(Value::Object(map))
    }

    fn deserialize(&self, json: &Value, _: &Registry) -> Result<Condition, CodecError> {
        expect_type(json, self.type_tag())?;
        Ok(Condition::StringStateAndState {
            state_id1: parsed_field(json, "stateId1")?,
            state_id2: parsed_field(json, "stateId2")?,
            sign: parsed_field(json, "sign")?,
        })
    }
}
