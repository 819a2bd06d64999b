use time::{Date, Duration, Weekday};

use crate::Error;

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sunday,
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
];

/// A non-empty set of weekdays.
///
/// Outside of Rust, weekdays are numbered from zero starting at Sunday, so
/// `[1, 3]` is Monday and Wednesday. Internally the set is a 7-bit mask using
/// the same numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DaysOfWeek(u8);

impl DaysOfWeek {
    /// Create a set from weekday numbers where 0 is Sunday and 6 is Saturday.
    ///
    /// Duplicates are ignored.
    ///
    /// # Errors
    /// Returns [Error::InvalidRecurrence] if `numbers` is empty or contains a
    /// number greater than 6.
    pub fn from_numbers(numbers: &[u8]) -> Result<Self, Error> {
        if numbers.is_empty() {
            return Err(Error::InvalidRecurrence(
                "at least one day of the week must be selected".to_owned(),
            ));
        }

        let mut bits = 0;

        for &number in numbers {
            if number > 6 {
                return Err(Error::InvalidRecurrence(format!(
                    "{number} is not a valid day of the week, expected 0 (Sunday) to 6 (Saturday)"
                )));
            }

            bits |= 1 << number;
        }

        Ok(Self(bits))
    }

    /// Create a set from a 7-bit mask, e.g. as read from the database.
    ///
    /// # Errors
    /// Returns [Error::InvalidRecurrence] if no bit is set or a bit above the
    /// seventh is set.
    pub fn from_bits(bits: u8) -> Result<Self, Error> {
        if bits == 0 || bits >= 1 << 7 {
            return Err(Error::InvalidRecurrence(format!(
                "{bits:#b} is not a valid set of weekdays"
            )));
        }

        Ok(Self(bits))
    }

    /// The 7-bit mask for storage.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether `weekday` is in the set.
    pub fn contains(self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.number_days_from_sunday()) != 0
    }

    /// The selected weekdays, starting from Sunday.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        SUNDAY_FIRST
            .into_iter()
            .filter(move |weekday| self.contains(*weekday))
    }

    /// The selected weekdays as numbers where 0 is Sunday.
    pub fn numbers(self) -> Vec<u8> {
        self.iter()
            .map(|weekday| weekday.number_days_from_sunday())
            .collect()
    }

    /// The dates of the selected weekdays in the Sunday-started week that
    /// contains `date`, in ascending order.
    ///
    /// Dates that fall outside the supported calendar range are skipped.
    pub fn dates_in_week_of(self, date: Date) -> Vec<Date> {
        let days_since_sunday = date.weekday().number_days_from_sunday();
        let Some(sunday) = date.checked_sub(Duration::days(days_since_sunday.into())) else {
            return Vec::new();
        };

        self.iter()
            .filter_map(|weekday| {
                sunday.checked_add(Duration::days(weekday.number_days_from_sunday().into()))
            })
            .collect()
    }
}

/// The three letter abbreviation for `weekday`, e.g. "Mon".
pub fn weekday_abbreviation(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sunday => "Sun",
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
    }
}

/// The weekdays from Sunday to Saturday paired with their numbers.
pub fn numbered_weekdays() -> impl Iterator<Item = (u8, Weekday)> {
    SUNDAY_FIRST
        .into_iter()
        .map(|weekday| (weekday.number_days_from_sunday(), weekday))
}

#[cfg(test)]
mod tests {
    use time::{Weekday, macros::date};

    use crate::Error;

    use super::DaysOfWeek;

    #[test]
    fn zero_is_sunday() {
        let days = DaysOfWeek::from_numbers(&[0, 6]).unwrap();

        assert!(days.contains(Weekday::Sunday));
        assert!(days.contains(Weekday::Saturday));
        assert!(!days.contains(Weekday::Monday));
        assert_eq!(days.bits(), 0b100_0001);
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let result = DaysOfWeek::from_numbers(&[1, 7]);

        assert!(matches!(result, Err(Error::InvalidRecurrence(_))));
    }

    #[test]
    fn rejects_empty_set() {
        assert!(matches!(
            DaysOfWeek::from_numbers(&[]),
            Err(Error::InvalidRecurrence(_))
        ));
        assert!(matches!(
            DaysOfWeek::from_bits(0),
            Err(Error::InvalidRecurrence(_))
        ));
        assert!(matches!(
            DaysOfWeek::from_bits(0b1000_0000),
            Err(Error::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn duplicates_collapse_and_numbers_are_sorted() {
        let days = DaysOfWeek::from_numbers(&[5, 1, 5, 3]).unwrap();

        assert_eq!(days.numbers(), vec![1, 3, 5]);
    }

    #[test]
    fn expands_into_dates_of_the_containing_week() {
        let days = DaysOfWeek::from_numbers(&[1, 3]).unwrap();

        // 2024-07-18 is a Thursday, its week starts on Sunday 2024-07-14.
        let got = days.dates_in_week_of(date!(2024 - 07 - 18));

        assert_eq!(got, vec![date!(2024 - 07 - 15), date!(2024 - 07 - 17)]);
    }
}
