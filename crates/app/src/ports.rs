//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod astro;
pub mod clock;
pub mod jobs;
pub mod state;

pub use astro::{AstroCalculator, Coordinates, SunTimes};
pub use clock::{Clock, SystemClock};
pub use jobs::{JobCallback, JobFuture, JobHandle, JobRule, JobScheduler};
pub use state::StateService;
