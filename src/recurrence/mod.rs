//! The recurrence projection engine.
//!
//! A [RecurrenceRule] describes when something repeats: its [Frequency],
//! [Interval], optional day of the month or weekdays, its date bounds and its
//! execution state. The functions in this module answer two questions about a
//! rule without touching any storage:
//!
//! - when does it fire next? ([compute_next_occurrence])
//! - may it fire on a given date? ([can_execute_on])

mod calendar;
mod engine;
mod frequency;
mod rule;
mod status;
mod weekdays;

pub use calendar::{add_months_clamped, add_years_clamped, last_day_of_month, with_day_clamped};
pub use engine::{can_execute_on, compute_next_occurrence, upcoming_occurrences};
pub use frequency::{Frequency, UnknownVariant};
pub use rule::{DayOfMonth, Interval, RecurrenceRule};
pub use status::{RuleStatus, StatusAction};
pub use weekdays::{DaysOfWeek, numbered_weekdays, weekday_abbreviation};
