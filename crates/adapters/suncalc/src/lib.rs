//! Solar event calculator.
//!
//! Implements [`AstroCalculator`](timeswitch_app::ports::AstroCalculator)
//! with the low-precision solar position formulas commonly used for
//! sunrise and twilight times. Results are accurate to about a minute.

pub mod calculator;
mod solar;

pub use calculator::SunCalcCalculator;
