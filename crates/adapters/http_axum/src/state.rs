//! Shared application state for axum handlers.

use std::sync::Arc;

use timeswitch_app::services::CommandProcessor;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so `S` itself does not need to be
/// `Clone`; only the `Arc` is cloned.
pub struct AppState<S> {
    pub processor: Arc<CommandProcessor<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
        }
    }
}

impl<S> AppState<S> {
    #[must_use]
    pub fn new(processor: Arc<CommandProcessor<S>>) -> Self {
        Self { processor }
    }
}
