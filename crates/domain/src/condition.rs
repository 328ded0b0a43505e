//! Condition: a predicate over external states guarding an action.

use std::fmt;
use std::str::FromStr;

use crate::id::StateId;

/// Comparison operator used by string conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqualitySign {
    Equal,
    NotEqual,
}

impl EqualitySign {
    /// Wire form: `==` or `!=`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }

    /// Apply the comparison.
    #[must_use]
    pub fn compare(self, left: &str, right: &str) -> bool {
        match self {
            Self::Equal => left == right,
            Self::NotEqual => left != right,
        }
    }
}

impl fmt::Display for EqualitySign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EqualitySign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Self::Equal),
            "!=" => Ok(Self::NotEqual),
            other => Err(format!("unknown sign `{other}`")),
        }
    }
}

/// A predicate evaluated against the stringified value of external states.
///
/// Evaluation itself needs state IO and lives in the application layer; the
/// domain only describes what to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Compares one state against a constant.
    StringStateAndConstant {
        state_id: StateId,
        constant: String,
        sign: EqualitySign,
    },
    /// Compares two states with each other.
    StringStateAndState {
        state_id1: StateId,
        state_id2: StateId,
        sign: EqualitySign,
    },
}

impl Condition {
    pub const STRING_STATE_AND_CONSTANT: &'static str = "StringStateAndConstantCondition";
    pub const STRING_STATE_AND_STATE: &'static str = "StringStateAndStateCondition";

    /// Stable type tag used by the codec registry.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::StringStateAndConstant { .. } => Self::STRING_STATE_AND_CONSTANT,
            Self::StringStateAndState { .. } => Self::STRING_STATE_AND_STATE,
        }
    }

    #[must_use]
    pub fn sign(&self) -> EqualitySign {
        match self {
            Self::StringStateAndConstant { sign, .. } | Self::StringStateAndState { sign, .. } => {
                *sign
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StringStateAndConstant {
                state_id,
                constant,
                sign,
            } => write!(f, "{state_id} {sign} \"{constant}\""),
            Self::StringStateAndState {
                state_id1,
                state_id2,
                sign,
            } => write!(f, "{state_id1} {sign} {state_id2}"),
        }
    }
}
