//! # timeswitch-domain
//!
//! Pure domain model for the timeswitch engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Triggers** (time, astro and one-time timing rules)
//! - Define **Actions** (on/off, conditional and set-value effects) and the
//!   per-schedule arena holding the canonical on/off pair
//! - Define **Conditions** (string comparisons over external states)
//! - Define **Schedules** (named, enable-able trigger lists)
//! - Convert all of the above to and from JSON envelopes (codec registry)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod codec;
pub mod condition;
pub mod schedule;
pub mod trigger;
pub mod value;
pub mod weekday;
