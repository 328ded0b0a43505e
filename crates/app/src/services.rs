//! Application services: use-case implementations.
//!
//! Services accept port implementations via generic parameters (constructor
//! injection), keeping this layer decoupled from concrete adapters.

pub mod command_processor;

pub use command_processor::{CommandProcessor, DEFAULT_RETRY_DELAY};
