//! # timeswitchd: timeswitch daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Load the state snapshot into the in-memory state store
//! - Construct the job scheduler, solar calculator and command processor
//! - Take over every schedule found in the state store
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT): disarm schedules and save
//!   the snapshot
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

pub mod config;
pub mod wiring;
