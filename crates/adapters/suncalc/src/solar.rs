//! Solar position formulas, in Julian days and radians.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};

const DAY_MS: f64 = 86_400_000.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
const J0: f64 = 0.0009;
const RAD: f64 = PI / 180.0;
/// Obliquity of the ecliptic.
const OBLIQUITY: f64 = RAD * 23.4397;

#[allow(clippy::cast_precision_loss)]
pub(crate) fn to_julian(date: DateTime<Utc>) -> f64 {
    date.timestamp_millis() as f64 / DAY_MS - 0.5 + J1970
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn from_julian(julian: f64) -> Option<DateTime<Utc>> {
    if !julian.is_finite() {
        return None;
    }
    let millis = ((julian + 0.5 - J1970) * DAY_MS).round();
    DateTime::from_timestamp_millis(millis as i64)
}

fn declination(longitude: f64) -> f64 {
    (longitude.sin() * OBLIQUITY.sin()).asin()
}

fn solar_mean_anomaly(days: f64) -> f64 {
    RAD * (357.5291 + 0.985_600_28 * days)
}

fn ecliptic_longitude(anomaly: f64) -> f64 {
    let center = RAD
        * (1.9148 * anomaly.sin() + 0.02 * (2.0 * anomaly).sin() + 0.0003 * (3.0 * anomaly).sin());
    let perihelion = RAD * 102.9372;
    anomaly + center + perihelion + PI
}

fn julian_cycle(days: f64, west_longitude: f64) -> f64 {
    (days - J0 - west_longitude / (2.0 * PI)).round()
}

fn approx_transit(hour_angle: f64, west_longitude: f64, cycle: f64) -> f64 {
    J0 + (hour_angle + west_longitude) / (2.0 * PI) + cycle
}

fn solar_transit(approx: f64, anomaly: f64, longitude: f64) -> f64 {
    J2000 + approx + 0.0053 * anomaly.sin() - 0.0069 * (2.0 * longitude).sin()
}

/// `None` when the sun never reaches `altitude` that day.
fn hour_angle(altitude: f64, latitude: f64, declination: f64) -> Option<f64> {
    let cos = (altitude.sin() - latitude.sin() * declination.sin())
        / (latitude.cos() * declination.cos());
    (-1.0..=1.0).contains(&cos).then(|| cos.acos())
}

/// Solar transit of one day at one location, from which rise and set
/// instants for any altitude are derived.
pub(crate) struct SolarDay {
    west_longitude: f64,
    latitude: f64,
    cycle: f64,
    anomaly: f64,
    longitude: f64,
    declination: f64,
    noon: f64,
}

impl SolarDay {
    pub(crate) fn new(date: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        let west_longitude = RAD * -longitude;
        let days = to_julian(date) - J2000;
        let cycle = julian_cycle(days, west_longitude);
        let transit = approx_transit(0.0, west_longitude, cycle);
        let anomaly = solar_mean_anomaly(transit);
        let ecliptic = ecliptic_longitude(anomaly);
        Self {
            west_longitude,
            latitude: RAD * latitude,
            cycle,
            anomaly,
            longitude: ecliptic,
            declination: declination(ecliptic),
            noon: solar_transit(transit, anomaly, ecliptic),
        }
    }

    pub(crate) fn noon(&self) -> f64 {
        self.noon
    }

    /// Julian dates at which the sun crosses `altitude` degrees, rising then
    /// setting.
    pub(crate) fn crossing(&self, altitude: f64) -> Option<(f64, f64)> {
        let angle = hour_angle(RAD * altitude, self.latitude, self.declination)?;
        let approx = approx_transit(angle, self.west_longitude, self.cycle);
        let set = solar_transit(approx, self.anomaly, self.longitude);
        Some((self.noon - (set - self.noon), set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn should_convert_unix_epoch_to_its_julian_date() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert!((to_julian(epoch) - 2_440_587.5).abs() < 1e-9);
    }

    #[test]
    fn should_convert_julian_date_back_to_instant() {
        let date = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        assert_eq!(from_julian(to_julian(date)), Some(date));
    }

    #[test]
    fn should_reject_non_finite_julian_date() {
        assert_eq!(from_julian(f64::NAN), None);
    }

    #[test]
    fn should_have_no_crossing_when_sun_stays_below_altitude() {
        // Tromsø-like latitude in December
        let date = Utc.with_ymd_and_hms(2024, 12, 21, 12, 0, 0).unwrap();
        let day = SolarDay::new(date, 78.0, 15.0);
        assert!(day.crossing(-0.833).is_none());
    }
}
