//! # timeswitch-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `StateService`: read and write external states
//!   - `JobScheduler`: arm recurring and single-shot timers
//!   - `AstroCalculator`: solar event times for a date and location
//!   - `Clock`: current local time
//! - Run actions and evaluate conditions (`ActionRunner`)
//! - Arm triggers through per-type schedulers behind a dispatcher
//! - Keep schedules and their schedulers in sync (`ManagedSchedule`)
//! - Apply command-channel messages one at a time (`CommandProcessor`)
//!
//! ## Dependency rule
//! Depends on `timeswitch-domain` only (plus `tokio` for timers and locks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod action_runner;
pub mod command;
pub mod managed_schedule;
pub mod ports;
pub mod schedulers;
pub mod services;
