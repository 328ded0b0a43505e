//! Astronomical port: solar event times for a date and location.

use std::collections::HashMap;

use timeswitch_domain::time::Timestamp;
use timeswitch_domain::trigger::AstroTime;

/// Observer position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Solar event instants for one day. Events that do not occur at the
/// location on that day (polar day or night) are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SunTimes {
    times: HashMap<AstroTime, Timestamp>,
}

impl SunTimes {
    pub fn insert(&mut self, time: AstroTime, at: Timestamp) {
        self.times.insert(time, at);
    }

    #[must_use]
    pub fn get(&self, time: AstroTime) -> Option<Timestamp> {
        self.times.get(&time).copied()
    }
}

impl FromIterator<(AstroTime, Timestamp)> for SunTimes {
    fn from_iter<I: IntoIterator<Item = (AstroTime, Timestamp)>>(iter: I) -> Self {
        Self {
            times: iter.into_iter().collect(),
        }
    }
}

/// Computes [`SunTimes`] for the day containing `date`.
pub trait AstroCalculator: Send + Sync {
    fn sun_times(&self, date: Timestamp, coordinates: Coordinates) -> SunTimes;
}
