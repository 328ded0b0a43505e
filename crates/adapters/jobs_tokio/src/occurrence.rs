//! Next-occurrence computation for recurring rules.

use chrono::{Days, Local, NaiveTime, TimeZone};

use timeswitch_domain::time::{LocalTime, weekday_number};
use timeswitch_domain::weekday::Weekdays;

/// First instant strictly after `after` falling on one of `weekdays` at
/// `hour:minute` local time.
///
/// Local times skipped by a daylight-saving jump do not occur; the next
/// matching day is used instead. Returns `None` only for an invalid
/// `hour:minute`.
#[must_use]
pub fn next_occurrence(
    weekdays: &Weekdays,
    hour: u8,
    minute: u8,
    after: LocalTime,
) -> Option<LocalTime> {
    let time = NaiveTime::from_hms_opt(u32::from(hour), u32::from(minute), 0)?;
    let today = after.date_naive();
    // a week and a day covers "today, but already passed" plus a DST gap
    (0..=8).find_map(|offset| {
        let date = today.checked_add_days(Days::new(offset))?;
        let candidate = Local.from_local_datetime(&date.and_time(time)).earliest()?;
        (candidate > after && weekdays.contains(weekday_number(&candidate))).then_some(candidate)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    // 2026-10-19 is a Monday
    fn monday(hour: u32, minute: u32) -> LocalTime {
        Local
            .with_ymd_and_hms(2026, 10, 19, hour, minute, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn should_pick_later_today_when_time_not_passed() {
        let next = next_occurrence(&Weekdays::single(1).unwrap(), 18, 30, monday(9, 0)).unwrap();
        assert_eq!(next.date_naive(), monday(0, 0).date_naive());
        assert_eq!((next.hour(), next.minute()), (18, 30));
    }

    #[test]
    fn should_skip_to_next_selected_day_when_time_passed() {
        let weekdays = Weekdays::new(vec![1, 3]).unwrap();
        let next = next_occurrence(&weekdays, 7, 0, monday(8, 0)).unwrap();
        assert_eq!(weekday_number(&next), 3);
        assert_eq!((next.hour(), next.minute()), (7, 0));
    }

    #[test]
    fn should_wait_a_full_week_for_single_passed_day() {
        let next = next_occurrence(&Weekdays::single(1).unwrap(), 7, 0, monday(7, 0)).unwrap();
        assert_eq!(next - monday(7, 0), chrono::Duration::days(7));
    }

    #[test]
    fn should_reject_invalid_time() {
        assert!(next_occurrence(&Weekdays::all(), 24, 0, monday(0, 0)).is_none());
    }
}
