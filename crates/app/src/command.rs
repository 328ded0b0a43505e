//! Command channel messages.
//!
//! A request is `{command, message}` where `message` always carries the
//! `dataId` of the schedule it targets. Parsing validates the message shape;
//! deserializing embedded triggers is left to the processor, which knows the
//! target schedule's action references.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use timeswitch_domain::error::CommandError;
use timeswitch_domain::id::{StateId, TriggerId};
use timeswitch_domain::trigger::{Trigger, TriggerType};
use timeswitch_domain::value::{StateValue, ValueType};

/// Raw command as received on the channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub message: Value,
}

/// A validated command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a default time or astro trigger switching "on" on every day.
    AddTrigger {
        data_id: StateId,
        trigger_type: TriggerType,
    },
    AddOneTimeTrigger {
        data_id: StateId,
        trigger: Value,
    },
    UpdateTrigger {
        data_id: StateId,
        trigger: Value,
    },
    DeleteTrigger {
        data_id: StateId,
        trigger_id: TriggerId,
    },
    ChangeName {
        data_id: StateId,
        name: String,
    },
    EnableSchedule {
        data_id: StateId,
        state_id: StateId,
    },
    DisableSchedule {
        data_id: StateId,
        state_id: StateId,
    },
    ChangeSwitchedValues {
        data_id: StateId,
        value_type: ValueType,
        on_value: StateValue,
        off_value: StateValue,
    },
    ChangeSwitchedIds {
        data_id: StateId,
        state_ids: Vec<StateId>,
    },
}

impl Command {
    pub const ADD_TRIGGER: &'static str = "add-trigger";
    pub const ADD_ONE_TIME_TRIGGER: &'static str = "add-one-time-trigger";
    pub const UPDATE_TRIGGER: &'static str = "update-trigger";
    pub const DELETE_TRIGGER: &'static str = "delete-trigger";
    pub const CHANGE_NAME: &'static str = "change-name";
    pub const ENABLE_SCHEDULE: &'static str = "enable-schedule";
    pub const DISABLE_SCHEDULE: &'static str = "disable-schedule";
    pub const CHANGE_SWITCHED_VALUES: &'static str = "change-switched-values";
    pub const CHANGE_SWITCHED_IDS: &'static str = "change-switched-ids";

    pub const NAMES: [&'static str; 9] = [
        Self::ADD_TRIGGER,
        Self::ADD_ONE_TIME_TRIGGER,
        Self::UPDATE_TRIGGER,
        Self::DELETE_TRIGGER,
        Self::CHANGE_NAME,
        Self::ENABLE_SCHEDULE,
        Self::DISABLE_SCHEDULE,
        Self::CHANGE_SWITCHED_VALUES,
        Self::CHANGE_SWITCHED_IDS,
    ];

    /// Validate `message` for the command named `command`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownCommand`] for an unknown name and
    /// [`CommandError::InvalidMessage`] when a field is missing or malformed.
    pub fn parse(command: &str, message: &Value) -> Result<Self, CommandError> {
        if !Self::NAMES.contains(&command) {
            return Err(CommandError::UnknownCommand(command.to_string()));
        }
        let data_id = state_id(message, "dataId")?;
        let parsed = match command {
            Self::ADD_TRIGGER => {
                let action_type = string(message, "actionType")?;
                if action_type != timeswitch_domain::action::Action::ON_OFF_STATE {
                    return Err(invalid(format!("unsupported action type `{action_type}`")));
                }
                let trigger_type = match string(message, "triggerType")? {
                    Trigger::TIME => TriggerType::Time,
                    Trigger::ASTRO => TriggerType::Astro,
                    other => return Err(invalid(format!("unsupported trigger type `{other}`"))),
                };
                Self::AddTrigger {
                    data_id,
                    trigger_type,
                }
            }
            Self::ADD_ONE_TIME_TRIGGER => Self::AddOneTimeTrigger {
                data_id,
                trigger: embedded_json(message, "trigger")?,
            },
            Self::UPDATE_TRIGGER => Self::UpdateTrigger {
                data_id,
                trigger: embedded_json(message, "trigger")?,
            },
            Self::DELETE_TRIGGER => Self::DeleteTrigger {
                data_id,
                trigger_id: TriggerId::new(string(message, "triggerId")?)
                    .map_err(|e| invalid(format!("`triggerId`: {e}")))?,
            },
            Self::CHANGE_NAME => Self::ChangeName {
                data_id,
                name: string(message, "name")?.to_string(),
            },
            Self::ENABLE_SCHEDULE => Self::EnableSchedule {
                data_id,
                state_id: state_id(message, "stateId")?,
            },
            Self::DISABLE_SCHEDULE => Self::DisableSchedule {
                data_id,
                state_id: state_id(message, "stateId")?,
            },
            Self::CHANGE_SWITCHED_VALUES => Self::ChangeSwitchedValues {
                data_id,
                value_type: string(message, "valueType")?
                    .parse()
                    .map_err(|e| invalid(format!("`valueType`: {e}")))?,
                on_value: state_value(message, "onValue")?,
                off_value: state_value(message, "offValue")?,
            },
            Self::CHANGE_SWITCHED_IDS => Self::ChangeSwitchedIds {
                data_id,
                state_ids: message
                    .get("stateIds")
                    .and_then(Value::as_array)
                    .ok_or_else(|| invalid("`stateIds` must be an array"))?
                    .iter()
                    .map(|id| {
                        id.as_str()
                            .and_then(|id| StateId::new(id).ok())
                            .ok_or_else(|| invalid("`stateIds` must hold non-empty strings"))
                    })
                    .collect::<Result<_, _>>()?,
            },
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(parsed)
    }

    /// Validate a raw request.
    ///
    /// # Errors
    ///
    /// See [`Command::parse`].
    pub fn from_request(request: &CommandRequest) -> Result<Self, CommandError> {
        Self::parse(&request.command, &request.message)
    }

    /// Wire name of the command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTrigger { .. } => Self::ADD_TRIGGER,
            Self::AddOneTimeTrigger { .. } => Self::ADD_ONE_TIME_TRIGGER,
            Self::UpdateTrigger { .. } => Self::UPDATE_TRIGGER,
            Self::DeleteTrigger { .. } => Self::DELETE_TRIGGER,
            Self::ChangeName { .. } => Self::CHANGE_NAME,
            Self::EnableSchedule { .. } => Self::ENABLE_SCHEDULE,
            Self::DisableSchedule { .. } => Self::DISABLE_SCHEDULE,
            Self::ChangeSwitchedValues { .. } => Self::CHANGE_SWITCHED_VALUES,
            Self::ChangeSwitchedIds { .. } => Self::CHANGE_SWITCHED_IDS,
        }
    }

    /// State holding the serialized target schedule.
    #[must_use]
    pub fn data_id(&self) -> &StateId {
        match self {
            Self::AddTrigger { data_id, .. }
            | Self::AddOneTimeTrigger { data_id, .. }
            | Self::UpdateTrigger { data_id, .. }
            | Self::DeleteTrigger { data_id, .. }
            | Self::ChangeName { data_id, .. }
            | Self::EnableSchedule { data_id, .. }
            | Self::DisableSchedule { data_id, .. }
            | Self::ChangeSwitchedValues { data_id, .. }
            | Self::ChangeSwitchedIds { data_id, .. } => data_id,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.name(), self.data_id())
    }
}

fn invalid(reason: impl Into<String>) -> CommandError {
    CommandError::InvalidMessage(reason.into())
}

fn string<'a>(message: &'a Value, field: &str) -> Result<&'a str, CommandError> {
    message
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("`{field}` must be a string")))
}

fn state_id(message: &Value, field: &str) -> Result<StateId, CommandError> {
    StateId::new(string(message, field)?).map_err(|e| invalid(format!("`{field}`: {e}")))
}

fn state_value(message: &Value, field: &str) -> Result<StateValue, CommandError> {
    message
        .get(field)
        .and_then(StateValue::from_json)
        .ok_or_else(|| invalid(format!("`{field}` must be a string, number or boolean")))
}

/// An object field that may also arrive as a JSON-encoded string.
fn embedded_json(message: &Value, field: &str) -> Result<Value, CommandError> {
    match message.get(field) {
        Some(Value::String(raw)) => serde_json::from_str(raw)
            .map_err(|e| invalid(format!("`{field}` is not valid JSON: {e}"))),
        Some(value @ Value::Object(_)) => Ok(value.clone()),
        _ => Err(invalid(format!("`{field}` must be an object or a JSON string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_parse_add_trigger_for_astro_type() {
        let command = Command::parse(
            "add-trigger",
            &json!({"dataId": "onoff.0.data", "triggerType": "AstroTrigger", "actionType": "OnOffStateAction"}),
        )
        .unwrap();
        assert_eq!(
            command,
            Command::AddTrigger {
                data_id: StateId::new("onoff.0.data").unwrap(),
                trigger_type: TriggerType::Astro,
            }
        );
    }

    #[test]
    fn should_reject_add_trigger_for_one_time_type() {
        let result = Command::parse(
            "add-trigger",
            &json!({"dataId": "d", "triggerType": "OneTimeTrigger", "actionType": "OnOffStateAction"}),
        );
        assert!(matches!(result, Err(CommandError::InvalidMessage(_))));
    }

    #[test]
    fn should_accept_embedded_trigger_as_string_or_object_when_updating() {
        let object = json!({"type": "TimeTrigger", "id": "0"});
        let from_string = Command::parse(
            "update-trigger",
            &json!({"dataId": "d", "trigger": object.to_string()}),
        )
        .unwrap();
        let from_object =
            Command::parse("update-trigger", &json!({"dataId": "d", "trigger": object})).unwrap();
        assert_eq!(from_string, from_object);
    }

    #[test]
    fn should_reject_malformed_embedded_trigger() {
        let result = Command::parse(
            "add-one-time-trigger",
            &json!({"dataId": "d", "trigger": "{not json"}),
        );
        assert!(matches!(result, Err(CommandError::InvalidMessage(_))));
    }

    #[test]
    fn should_parse_switched_values_of_any_primitive() {
        let command = Command::parse(
            "change-switched-values",
            &json!({"dataId": "d", "valueType": "number", "onValue": 21, "offValue": 17.5}),
        )
        .unwrap();
        assert_eq!(
            command,
            Command::ChangeSwitchedValues {
                data_id: StateId::new("d").unwrap(),
                value_type: ValueType::Number,
                on_value: StateValue::Number(21.0),
                off_value: StateValue::Number(17.5),
            }
        );
    }

    #[test]
    fn should_reject_empty_state_id_in_switched_ids() {
        let result = Command::parse(
            "change-switched-ids",
            &json!({"dataId": "d", "stateIds": ["lamp", ""]}),
        );
        assert!(matches!(result, Err(CommandError::InvalidMessage(_))));
    }

    #[test]
    fn should_reject_unknown_command() {
        assert_eq!(
            Command::parse("reboot", &json!({})),
            Err(CommandError::UnknownCommand("reboot".to_string()))
        );
    }

    #[test]
    fn should_reject_message_without_data_id() {
        assert!(matches!(
            Command::parse("change-name", &json!({"name": "x"})),
            Err(CommandError::InvalidMessage(_))
        ));
    }

    #[test]
    fn should_deserialize_request_envelope() {
        let request: CommandRequest = serde_json::from_value(json!({
            "command": "delete-trigger",
            "message": {"dataId": "d", "triggerId": "3"}
        }))
        .unwrap();
        let command = Command::from_request(&request).unwrap();
        assert_eq!(command.name(), "delete-trigger");
        assert_eq!(command.to_string(), "delete-trigger on d");
    }
}
