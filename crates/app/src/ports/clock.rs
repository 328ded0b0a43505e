//! Clock port.

use timeswitch_domain::time::LocalTime;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> LocalTime;
}

/// Wall clock of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> LocalTime {
        chrono::Local::now()
    }
}
