//! Time and timestamp helpers.

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};

/// UTC instant used for one-time trigger dates and astronomical results.
pub type Timestamp = DateTime<Utc>;

/// Wall-clock time in the host's timezone; recurring triggers are expressed in it.
pub type LocalTime = DateTime<Local>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Weekday number of `time`, `0` for Sunday through `6` for Saturday.
#[must_use]
pub fn weekday_number(time: &LocalTime) -> u8 {
    // num_days_from_sunday is always in 0..=6
    u8::try_from(time.weekday().num_days_from_sunday()).unwrap_or(0)
}

/// Noon of the calendar day of `time` in its own timezone, as a UTC instant.
///
/// Solar events of one local day are computed around this instant. `None`
/// when noon does not exist that day.
#[must_use]
pub fn local_noon<Tz: TimeZone>(time: &DateTime<Tz>) -> Option<Timestamp> {
    let noon = time.date_naive().and_hms_opt(12, 0, 0)?;
    time.timezone()
        .from_local_datetime(&noon)
        .earliest()
        .map(|noon| noon.with_timezone(&Utc))
}
