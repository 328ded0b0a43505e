//! # timeswitch-adapter-jobs-tokio
//!
//! Implementation of the `JobScheduler` port on top of tokio timers.
//!
//! ## Responsibilities
//! - Arm one task per job, sleeping until the next occurrence of its rule
//! - Compute the next local wall-clock occurrence of recurring rules
//! - Cancel jobs through per-job cancellation tokens
//!
//! ## Dependency rule
//! Depends on `timeswitch-app` (for the port trait) and `timeswitch-domain`.
//! The `app` and `domain` crates must never reference this adapter.

pub mod occurrence;
pub mod scheduler;

pub use occurrence::next_occurrence;
pub use scheduler::TokioJobScheduler;
