use std::fmt;

use time::Date;

use crate::{
    Error,
    recurrence::{
        frequency::Frequency,
        status::RuleStatus,
        weekdays::{DaysOfWeek, weekday_abbreviation},
    },
};

/// How many periods pass between occurrences, always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval(u32);

impl Interval {
    /// Every single period.
    pub const ONE: Interval = Interval(1);

    /// # Errors
    /// Returns [Error::InvalidRecurrence] if `periods` is zero.
    pub fn new(periods: u32) -> Result<Self, Error> {
        if periods == 0 {
            return Err(Error::InvalidRecurrence(
                "the interval must be at least 1".to_owned(),
            ));
        }

        Ok(Self(periods))
    }

    /// The number of periods.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A day of the month between 1 and 31.
///
/// Months shorter than the requested day are clamped to their last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayOfMonth(u8);

impl DayOfMonth {
    /// # Errors
    /// Returns [Error::InvalidRecurrence] if `day` is not between 1 and 31.
    pub fn new(day: u8) -> Result<Self, Error> {
        if !(1..=31).contains(&day) {
            return Err(Error::InvalidRecurrence(format!(
                "{day} is not a valid day of the month, expected 1 to 31"
            )));
        }

        Ok(Self(day))
    }

    /// The day number.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for DayOfMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The schedule and execution state of a recurring rule.
///
/// This is everything the projection engine looks at. The transaction
/// template (amount, description) lives on
/// [RecurringRule](crate::RecurringRule).
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    /// The base period.
    pub frequency: Frequency,
    /// Fire every `interval` periods.
    pub interval: Interval,
    /// Anchors monthly, quarterly and yearly rules to a day of the month.
    pub day_of_month: Option<DayOfMonth>,
    /// The weekdays selected for weekly rules.
    ///
    /// These are descriptive only, see [crate::recurrence::compute_next_occurrence].
    pub days_of_week: Option<DaysOfWeek>,
    /// The rule has no effect before this date.
    pub start_date: Date,
    /// The rule has no effect after this date.
    pub end_date: Option<Date>,
    /// The lifecycle status.
    pub status: RuleStatus,
    /// Soft-disable flag, independent of `status`.
    pub enabled: bool,
    /// How many occurrences have been turned into transactions.
    pub total_executions: u32,
    /// The rule expires once `total_executions` reaches this number.
    pub max_executions: Option<u32>,
    /// The date of the most recently materialized occurrence.
    pub last_execution_date: Option<Date>,
    /// The date of the next occurrence waiting to be materialized.
    pub next_execution_date: Option<Date>,
}

impl RecurrenceRule {
    /// Create an active, enabled rule that has never executed.
    ///
    /// The first occurrence is `start_date`.
    pub fn new(frequency: Frequency, interval: Interval, start_date: Date) -> Self {
        Self {
            frequency,
            interval,
            day_of_month: None,
            days_of_week: None,
            start_date,
            end_date: None,
            status: RuleStatus::Active,
            enabled: true,
            total_executions: 0,
            max_executions: None,
            last_execution_date: None,
            next_execution_date: Some(start_date),
        }
    }

    /// Set the day of the month anchor.
    pub fn day_of_month(mut self, day_of_month: Option<DayOfMonth>) -> Self {
        self.day_of_month = day_of_month;
        self
    }

    /// Set the weekdays for a weekly rule.
    pub fn days_of_week(mut self, days_of_week: Option<DaysOfWeek>) -> Self {
        self.days_of_week = days_of_week;
        self
    }

    /// Set the last date on which the rule may fire.
    ///
    /// # Errors
    /// Returns [Error::InvalidRecurrence] if `end_date` is not after the start date.
    pub fn end_date(mut self, end_date: Option<Date>) -> Result<Self, Error> {
        match end_date {
            Some(end_date) if end_date <= self.start_date => {
                return Err(Error::InvalidRecurrence(format!(
                    "the end date {end_date} must be after the start date {}",
                    self.start_date
                )));
            }
            Some(_) | None => {}
        }

        self.end_date = end_date;
        Ok(self)
    }

    /// Cap the number of executions.
    ///
    /// # Errors
    /// Returns [Error::InvalidRecurrence] if `max_executions` is zero.
    pub fn max_executions(mut self, max_executions: Option<u32>) -> Result<Self, Error> {
        if max_executions == Some(0) {
            return Err(Error::InvalidRecurrence(
                "the maximum number of executions must be at least 1".to_owned(),
            ));
        }

        self.max_executions = max_executions;
        Ok(self)
    }

    /// Set the soft-disable flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether the rule is enabled and [RuleStatus::Active].
    pub fn is_operationally_active(&self) -> bool {
        self.enabled && self.status == RuleStatus::Active
    }

    /// Whether the rule has passed its end date as of `reference_date` or
    /// has used up its executions.
    pub fn is_expired(&self, reference_date: Date) -> bool {
        let past_end_date = self
            .end_date
            .is_some_and(|end_date| reference_date > end_date);
        let exhausted = self
            .max_executions
            .is_some_and(|max_executions| self.total_executions >= max_executions);

        past_end_date || exhausted
    }

    /// The number of occurrences left before the execution cap, if any.
    pub fn remaining_executions(&self) -> Option<u32> {
        self.max_executions
            .map(|max_executions| max_executions.saturating_sub(self.total_executions))
    }

    /// A human readable summary of the schedule, e.g. "Every 2 months on day 5".
    pub fn describe(&self) -> String {
        let mut description = if self.interval == Interval::ONE {
            self.frequency.display_name().to_owned()
        } else {
            let (_, plural) = self.frequency.unit();
            format!("Every {} {plural}", self.interval)
        };

        match (self.frequency, self.day_of_month, self.days_of_week) {
            (Frequency::Weekly, _, Some(days_of_week)) => {
                let names: Vec<&str> = days_of_week.iter().map(weekday_abbreviation).collect();
                description.push_str(&format!(" ({})", names.join(", ")));
            }
            (frequency, Some(day_of_month), _) if frequency.uses_day_of_month() => {
                description.push_str(&format!(" on day {day_of_month}"));
            }
            _ => {}
        }

        description
    }
}
