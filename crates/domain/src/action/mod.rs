//! Action: the effect performed when a trigger fires.
//!
//! Actions are plain data. Executing them needs state IO and is done by the
//! application layer's action runner.

mod on_off;
mod set_state_value;

pub use on_off::{OnOffStateAction, OnOffStateActionBuilder};
pub use set_state_value::SetStateValueAction;

use std::fmt;

use crate::condition::Condition;
use crate::id::TriggerId;

/// Slot in a schedule's action arena holding one of the canonical on/off actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSlot {
    On,
    Off,
}

impl ActionSlot {
    /// Reference name used on the wire (`"On"` / `"Off"`).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::On => "On",
            Self::Off => "Off",
        }
    }

    /// Look a slot up by its reference name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "On" => Some(Self::On),
            "Off" => Some(Self::Off),
            _ => None,
        }
    }

    /// The `boolean_value` the action in this slot carries.
    #[must_use]
    pub fn polarity(self) -> bool {
        matches!(self, Self::On)
    }

    #[must_use]
    pub fn from_polarity(polarity: bool) -> Self {
        if polarity { Self::On } else { Self::Off }
    }
}

/// Executes the inner action only when the condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionAction {
    condition: Condition,
    action: Box<Action>,
}

impl ConditionAction {
    #[must_use]
    pub fn new(condition: Condition, action: Action) -> Self {
        Self {
            condition,
            action: Box::new(action),
        }
    }

    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn set_action(&mut self, action: Action) {
        self.action = Box::new(action);
    }
}

/// An executable effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OnOffState(OnOffStateAction),
    Condition(ConditionAction),
    SetStateValue(SetStateValueAction),
    /// Reference to one of the owning schedule's canonical actions.
    Shared(ActionSlot),
}

impl Action {
    pub const ON_OFF_STATE: &'static str = "OnOffStateAction";
    pub const CONDITION: &'static str = "ConditionAction";
    pub const SET_STATE_VALUE: &'static str = "SetStateValueAction";

    /// Stable type tag used by the codec registry.
    ///
    /// Shared references point at on/off actions and carry that tag.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::OnOffState(_) | Self::Shared(_) => Self::ON_OFF_STATE,
            Self::Condition(_) => Self::CONDITION,
            Self::SetStateValue(_) => Self::SET_STATE_VALUE,
        }
    }

    /// The on/off polarity of this action, if it is an on/off action.
    #[must_use]
    pub fn polarity(&self) -> Option<bool> {
        match self {
            Self::OnOffState(action) => Some(action.boolean_value()),
            Self::Shared(slot) => Some(slot.polarity()),
            Self::Condition(_) | Self::SetStateValue(_) => None,
        }
    }

    /// Replace every shared reference with a copy of the arena value.
    #[must_use]
    pub fn resolve(&self, arena: &OnOffActions) -> Self {
        match self {
            Self::Shared(slot) => Self::OnOffState(arena.get(*slot).clone()),
            Self::Condition(inner) => Self::Condition(ConditionAction::new(
                inner.condition.clone(),
                inner.action.resolve(arena),
            )),
            Self::OnOffState(_) | Self::SetStateValue(_) => self.clone(),
        }
    }

    /// Whether this action still contains an unresolved shared reference.
    #[must_use]
    pub fn has_shared_reference(&self) -> bool {
        match self {
            Self::Shared(_) => true,
            Self::Condition(inner) => inner.action.has_shared_reference(),
            Self::OnOffState(_) | Self::SetStateValue(_) => false,
        }
    }

    /// Point every on/off action of `slot`'s polarity at `slot`, including
    /// the inner action of a condition action. Returns whether anything changed.
    pub fn rebind_to_slot(&mut self, slot: ActionSlot) -> bool {
        if let Self::Condition(inner) = self {
            return inner.action.rebind_to_slot(slot);
        }
        if *self == Self::Shared(slot) || self.polarity() != Some(slot.polarity()) {
            return false;
        }
        *self = Self::Shared(slot);
        true
    }

    /// Record the owning trigger on every set-state-value action.
    pub(crate) fn stamp_owner(&mut self, owner: &TriggerId) {
        match self {
            Self::SetStateValue(action) => action.set_trigger(owner.clone()),
            Self::Condition(inner) => inner.action.stamp_owner(owner),
            Self::OnOffState(_) | Self::Shared(_) => {}
        }
    }
}

impl From<OnOffStateAction> for Action {
    fn from(action: OnOffStateAction) -> Self {
        Self::OnOffState(action)
    }
}

impl From<ConditionAction> for Action {
    fn from(action: ConditionAction) -> Self {
        Self::Condition(action)
    }
}

impl From<SetStateValueAction> for Action {
    fn from(action: SetStateValueAction) -> Self {
        Self::SetStateValue(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOffState(action) => write!(
                f,
                "on_off({}, {} states)",
                action.value_to_set(),
                action.ids_of_states_to_set().len()
            ),
            Self::Condition(action) => write!(f, "if({}) {}", action.condition, action.action),
            Self::SetStateValue(action) => {
                write!(f, "set({}, {})", action.id_of_state_to_set(), action.value())
            }
            Self::Shared(slot) => write!(f, "shared({})", slot.name()),
        }
    }
}

/// Arena owning a schedule's canonical on/off actions.
///
/// Triggers refer to these through [`Action::Shared`] instead of holding copies.
#[derive(Debug, Clone, PartialEq)]
pub struct OnOffActions {
    on: OnOffStateAction,
    off: OnOffStateAction,
}

impl OnOffActions {
    #[must_use]
    pub fn new(on: OnOffStateAction, off: OnOffStateAction) -> Self {
        Self { on, off }
    }

    #[must_use]
    pub fn get(&self, slot: ActionSlot) -> &OnOffStateAction {
        match slot {
            ActionSlot::On => &self.on,
            ActionSlot::Off => &self.off,
        }
    }

    pub fn get_mut(&mut self, slot: ActionSlot) -> &mut OnOffStateAction {
        match slot {
            ActionSlot::On => &mut self.on,
            ActionSlot::Off => &mut self.off,
        }
    }

    /// Swap the action in `slot`, returning the previous one.
    pub fn replace(&mut self, slot: ActionSlot, action: OnOffStateAction) -> OnOffStateAction {
        std::mem::replace(self.get_mut(slot), action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::EqualitySign;
    use crate::id::StateId;
    use crate::value::ValueType;

    fn arena() -> OnOffActions {
        let (on, off) = OnOffStateAction::pair(
            ValueType::Boolean,
            vec![StateId::new("lamp.on").unwrap()],
            true.into(),
            false.into(),
        )
        .unwrap();
        OnOffActions::new(on, off)
    }

    fn condition() -> Condition {
        Condition::StringStateAndConstant {
            state_id: StateId::new("presence").unwrap(),
            constant: "home".to_string(),
            sign: EqualitySign::Equal,
        }
    }

    #[test]
    fn should_resolve_shared_reference_to_arena_value() {
        let arena = arena();
        let resolved = Action::Shared(ActionSlot::On).resolve(&arena);
        assert_eq!(resolved, Action::OnOffState(arena.get(ActionSlot::On).clone()));
        assert!(!resolved.has_shared_reference());
    }

    #[test]
    fn should_resolve_reference_nested_in_condition_action() {
        let arena = arena();
        let action = Action::Condition(ConditionAction::new(
            condition(),
            Action::Shared(ActionSlot::Off),
        ));
        assert!(action.has_shared_reference());
        let resolved = action.resolve(&arena);
        assert!(!resolved.has_shared_reference());
    }

    #[test]
    fn should_rebind_inline_action_with_matching_polarity() {
        let mut action = Action::OnOffState(arena().get(ActionSlot::On).clone());
        assert!(action.rebind_to_slot(ActionSlot::On));
        assert_eq!(action, Action::Shared(ActionSlot::On));
    }

    #[test]
    fn should_not_rebind_action_with_opposite_polarity() {
        let mut action = Action::Shared(ActionSlot::Off);
        assert!(!action.rebind_to_slot(ActionSlot::On));
        assert_eq!(action, Action::Shared(ActionSlot::Off));
    }

    #[test]
    fn should_rebind_inner_action_of_condition_action() {
        let inline = Action::OnOffState(arena().get(ActionSlot::On).clone());
        let mut action = Action::Condition(ConditionAction::new(condition(), inline));
        assert!(action.rebind_to_slot(ActionSlot::On));
        match action {
            Action::Condition(inner) => assert_eq!(inner.action(), &Action::Shared(ActionSlot::On)),
            other => panic!("expected condition action, got {other}"),
        }
    }

    #[test]
    fn should_report_on_off_tag_for_shared_reference() {
        assert_eq!(Action::Shared(ActionSlot::Off).type_tag(), "OnOffStateAction");
    }

    #[test]
    fn should_map_slot_names_both_ways() {
        assert_eq!(ActionSlot::from_name("On"), Some(ActionSlot::On));
        assert_eq!(ActionSlot::from_name("Off"), Some(ActionSlot::Off));
        assert_eq!(ActionSlot::from_name("on"), None);
        assert_eq!(ActionSlot::Off.name(), "Off");
    }
}
