//! # timeswitch-adapter-state-memory
//!
//! In-memory implementation of the `StateService` port.
//!
//! ## Responsibilities
//! - Hold every state value together with its acknowledge flag
//! - List states under a prefix, used to discover stored schedules
//! - Load and save a JSON snapshot so schedules survive restarts
//!
//! ## Dependency rule
//! Depends on `timeswitch-app` (for the port trait) and `timeswitch-domain`
//! (for state types). The `app` and `domain` crates must never reference this
//! adapter.

pub mod error;
pub mod store;

pub use error::SnapshotError;
pub use store::{InMemoryStateStore, StoredState};
