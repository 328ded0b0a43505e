//! [`AstroCalculator`] implementation.

use timeswitch_app::ports::{AstroCalculator, Coordinates, SunTimes};
use timeswitch_domain::time::Timestamp;
use timeswitch_domain::trigger::AstroTime;

use crate::solar::{SolarDay, from_julian};

/// Sun altitude in degrees with the events reached rising and setting.
const ALTITUDES: [(f64, AstroTime, AstroTime); 6] = [
    (-0.833, AstroTime::Sunrise, AstroTime::Sunset),
    (-0.3, AstroTime::SunriseEnd, AstroTime::SunsetStart),
    (-6.0, AstroTime::Dawn, AstroTime::Dusk),
    (-12.0, AstroTime::NauticalDawn, AstroTime::NauticalDusk),
    (-18.0, AstroTime::NightEnd, AstroTime::Night),
    (6.0, AstroTime::GoldenHourEnd, AstroTime::GoldenHour),
];

/// Computes solar events with the formulas in [`crate::solar`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SunCalcCalculator;

impl SunCalcCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AstroCalculator for SunCalcCalculator {
    fn sun_times(&self, date: Timestamp, coordinates: Coordinates) -> SunTimes {
        let day = SolarDay::new(date, coordinates.latitude, coordinates.longitude);
        let mut times = SunTimes::default();
        if let Some(noon) = from_julian(day.noon()) {
            times.insert(AstroTime::SolarNoon, noon);
        }
        if let Some(nadir) = from_julian(day.noon() - 0.5) {
            times.insert(AstroTime::Nadir, nadir);
        }
        for (altitude, rising, setting) in ALTITUDES {
            let Some((rise, set)) = day.crossing(altitude) else {
                tracing::debug!(%date, altitude, "sun does not cross altitude");
                continue;
            };
            if let Some(at) = from_julian(rise) {
                times.insert(rising, at);
            }
            if let Some(at) = from_julian(set) {
                times.insert(setting, at);
            }
        }
        times
    }
}
