//! State port: reads and writes of external states.

use std::future::Future;

use timeswitch_domain::error::StateError;
use timeswitch_domain::id::StateId;
use timeswitch_domain::value::StateValue;

/// Access to the host's state storage.
///
/// "Own" states belong to this engine (schedule data, enabled flags) and are
/// written with an acknowledgement flag. "Foreign" states belong to other
/// components and are the targets of actions and the inputs of conditions.
pub trait StateService: Send + Sync {
    /// Write one of this engine's own states.
    fn set_state(
        &self,
        id: StateId,
        value: StateValue,
        ack: bool,
    ) -> impl Future<Output = Result<(), StateError>> + Send;

    /// Read any state.
    ///
    /// Fails with [`StateError::NotFound`] when the state does not exist or
    /// holds no value.
    fn get_foreign_state(
        &self,
        id: StateId,
    ) -> impl Future<Output = Result<StateValue, StateError>> + Send;

    /// Write a state owned by another component.
    fn set_foreign_state(
        &self,
        id: StateId,
        value: StateValue,
    ) -> impl Future<Output = Result<(), StateError>> + Send;
}

impl<T: StateService> StateService for std::sync::Arc<T> {
    fn set_state(
        &self,
        id: StateId,
        value: StateValue,
        ack: bool,
    ) -> impl Future<Output = Result<(), StateError>> + Send {
        (**self).set_state(id, value, ack)
    }

    fn get_foreign_state(
        &self,
        id: StateId,
    ) -> impl Future<Output = Result<StateValue, StateError>> + Send {
        (**self).get_foreign_state(id)
    }

    fn set_foreign_state(
        &self,
        id: StateId,
        value: StateValue,
    ) -> impl Future<Output = Result<(), StateError>> + Send {
        (**self).set_foreign_state(id, value)
    }
}
