use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The error returned when text does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid {1}")]
pub struct UnknownVariant(pub String, pub &'static str);

/// How often a recurring rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every `interval` days.
    Daily,
    /// Every `interval` weeks.
    Weekly,
    /// Every `interval` calendar months.
    Monthly,
    /// Every `interval` quarters, i.e. three calendar months each.
    Quarterly,
    /// Every `interval` calendar years.
    Yearly,
}

impl Frequency {
    /// All frequencies in display order.
    pub const ALL: [Frequency; 5] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ];

    /// The identifier used for storage and form values.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The name shown to users, e.g. "Monthly".
    pub fn display_name(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
            Frequency::Yearly => "Yearly",
        }
    }

    /// The singular and plural unit for "every N ..." phrases.
    pub(crate) fn unit(self) -> (&'static str, &'static str) {
        match self {
            Frequency::Daily => ("day", "days"),
            Frequency::Weekly => ("week", "weeks"),
            Frequency::Monthly => ("month", "months"),
            Frequency::Quarterly => ("quarter", "quarters"),
            Frequency::Yearly => ("year", "years"),
        }
    }

    /// Whether `day_of_month` anchors this frequency.
    ///
    /// Yearly rules keep the month and day of their reference date.
    pub fn uses_day_of_month(self) -> bool {
        match self {
            Frequency::Monthly | Frequency::Quarterly => true,
            Frequency::Daily | Frequency::Weekly | Frequency::Yearly => false,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Frequency {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_owned(), "frequency"))
    }
}

#[cfg(test)]
mod tests {
    use super::{Frequency, UnknownVariant};

    #[test]
    fn parses_storage_identifiers() {
        for frequency in Frequency::ALL {
            assert_eq!(frequency.as_str().parse::<Frequency>(), Ok(frequency));
        }
    }

    #[test]
    fn rejects_unknown_identifier() {
        assert_eq!(
            "fortnightly".parse::<Frequency>(),
            Err(UnknownVariant("fortnightly".to_owned(), "frequency"))
        );
    }

    #[test]
    fn only_month_based_frequencies_use_day_of_month() {
        assert!(!Frequency::Daily.uses_day_of_month());
        assert!(!Frequency::Weekly.uses_day_of_month());
        assert!(Frequency::Monthly.uses_day_of_month());
        assert!(Frequency::Quarterly.uses_day_of_month());
        assert!(!Frequency::Yearly.uses_day_of_month());
    }
}
