//! Action runner: performs actions and evaluates conditions against the
//! state port.
//!
//! Failures never propagate out of [`ActionRunner::execute`]: a fired trigger
//! has no caller to report to, so write errors are logged and condition
//! errors make the guarded action not run.

use std::future::Future;
use std::pin::Pin;

use timeswitch_domain::action::Action;
use timeswitch_domain::condition::Condition;
use timeswitch_domain::error::StateError;
use timeswitch_domain::id::StateId;
use timeswitch_domain::value::StateValue;

use crate::ports::StateService;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Executes [`Action`]s through a [`StateService`].
pub struct ActionRunner<S> {
    states: S,
}

impl<S: StateService> ActionRunner<S> {
    pub fn new(states: S) -> Self {
        Self { states }
    }

    pub fn states(&self) -> &S {
        &self.states
    }

    /// Perform `action`. Shared references must be resolved beforehand.
    pub fn execute<'a>(&'a self, action: &'a Action) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            match action {
                Action::OnOffState(action) => {
                    let value = action.value_to_set();
                    for id in action.ids_of_states_to_set() {
                        self.write(id, value).await;
                    }
                }
                Action::SetStateValue(action) => {
                    self.write(action.id_of_state_to_set(), action.value()).await;
                }
                Action::Condition(action) => match self.evaluate(action.condition()).await {
                    Ok(true) => self.execute(action.action()).await,
                    Ok(false) => {
                        tracing::debug!(condition = %action.condition(), "condition not met, skipping action");
                    }
                    Err(error) => {
                        tracing::warn!(condition = %action.condition(), %error, "condition evaluation failed, skipping action");
                    }
                },
                Action::Shared(slot) => {
                    tracing::error!(slot = slot.name(), "unresolved shared action reached the runner");
                }
            }
        })
    }

    /// Evaluate `condition` on the stringified values of the involved states.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when a state cannot be read.
    pub async fn evaluate(&self, condition: &Condition) -> Result<bool, StateError> {
        match condition {
            Condition::StringStateAndConstant {
                state_id,
                constant,
                sign,
            } => {
                let value = self.states.get_foreign_state(state_id.clone()).await?;
                Ok(sign.compare(&value.to_string(), constant))
            }
            Condition::StringStateAndState {
                state_id1,
                state_id2,
                sign,
            } => {
                let first = self.states.get_foreign_state(state_id1.clone()).await?;
                let second = self.states.get_foreign_state(state_id2.clone()).await?;
                Ok(sign.compare(&first.to_string(), &second.to_string()))
            }
        }
    }

    async fn write(&self, id: &StateId, value: &StateValue) {
        tracing::debug!(state_id = %id, %value, "setting state");
        if let Err(error) = self
            .states
            .set_foreign_state(id.clone(), value.clone())
            .await
        {
            tracing::warn!(state_id = %id, %error, "failed to set state");
        }
    }
}
