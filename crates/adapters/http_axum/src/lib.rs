//! # timeswitch-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Accept command-channel messages on `POST /api/commands` and hand them
//!   to the [`CommandProcessor`](timeswitch_app::services::CommandProcessor)
//! - Expose the serialized schedules for inspection
//! - Map [`TimeSwitchError`](timeswitch_domain::error::TimeSwitchError)
//!   into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `timeswitch-app` (for the processor and port traits) and
//! `timeswitch-domain` (for errors and identifiers). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
