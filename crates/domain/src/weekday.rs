//! Weekday sets for recurring triggers.

use crate::error::ValidationError;

/// Every day of the week, Sunday first.
pub const ALL_WEEKDAYS: [u8; 7] = [0, 1, 2, 3, 4, 5, 6];

/// A non-empty set of weekdays (`0` = Sunday … `6` = Saturday).
///
/// Holds between one and seven distinct days, in the order they were given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Weekdays(Vec<u8>);

impl Weekdays {
    /// Validate and wrap a list of weekday numbers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the list is empty, longer than seven,
    /// contains a value outside `0..=6`, or contains a duplicate.
    pub fn new(days: impl Into<Vec<u8>>) -> Result<Self, ValidationError> {
        let days = days.into();
        if days.is_empty() || days.len() > 7 {
            return Err(ValidationError::WeekdayCount(days.len()));
        }
        let mut seen = [false; 7];
        for &day in &days {
            let slot = seen
                .get_mut(usize::from(day))
                .ok_or(ValidationError::WeekdayOutOfRange(day))?;
            if *slot {
                return Err(ValidationError::DuplicateWeekday(day));
            }
            *slot = true;
        }
        Ok(Self(days))
    }

    /// All seven days.
    #[must_use]
    pub fn all() -> Self {
        Self(ALL_WEEKDAYS.to_vec())
    }

    /// A single day. Values above 6 are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::WeekdayOutOfRange`] when `day > 6`.
    pub fn single(day: u8) -> Result<Self, ValidationError> {
        Self::new(vec![day])
    }

    #[must_use]
    pub fn contains(&self, day: u8) -> bool {
        self.0.contains(&day)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}
