//! Projects the occurrence dates of a [RecurrenceRule].
//!
//! Everything here is a pure function of its arguments: no I/O, no clock
//! reads except when the caller omits the reference date, and no mutation of
//! the rule.

use time::{Date, Duration, OffsetDateTime};

use crate::recurrence::{
    calendar::{add_months_clamped, add_years_clamped, with_day_clamped},
    frequency::Frequency,
    rule::RecurrenceRule,
};

/// The most steps [upcoming_occurrences] takes before giving up, which
/// covers more than ten years of a daily rule.
const MAX_PROJECTION_STEPS: usize = 4_000;

/// Compute the occurrence that follows `reference_date`.
///
/// `reference_date` defaults to today (UTC) when `None`.
///
/// Returns `None` if the rule is not operationally active, if it has expired
/// as of the reference date, or if the next date would fall outside the
/// supported calendar range.
///
/// Weekly rules step by whole weeks from the reference date. The selected
/// `days_of_week` do not move the result onto one of those weekdays; use
/// [DaysOfWeek::dates_in_week_of](crate::recurrence::DaysOfWeek::dates_in_week_of)
/// to expand a week into its selected days.
pub fn compute_next_occurrence(
    rule: &RecurrenceRule,
    reference_date: Option<Date>,
) -> Option<Date> {
    let reference_date = reference_date.unwrap_or_else(|| OffsetDateTime::now_utc().date());

    if !rule.is_operationally_active() || rule.is_expired(reference_date) {
        return None;
    }

    let interval = rule.interval.get();

    let next_date = match rule.frequency {
        Frequency::Daily => reference_date.checked_add(Duration::days(interval.into()))?,
        Frequency::Weekly => reference_date.checked_add(Duration::weeks(interval.into()))?,
        Frequency::Monthly => add_months_clamped(reference_date, interval)?,
        Frequency::Quarterly => add_months_clamped(reference_date, interval.checked_mul(3)?)?,
        Frequency::Yearly => add_years_clamped(reference_date, interval)?,
    };

    let next_date = match rule.day_of_month {
        Some(day_of_month) if rule.frequency.uses_day_of_month() => {
            with_day_clamped(next_date, day_of_month.get())
        }
        _ => next_date,
    };

    Some(next_date)
}

/// Whether `rule` may produce a transaction dated `candidate_date`.
///
/// The rule must be operationally active, `candidate_date` must lie within
/// the rule's start and end dates (inclusive), and the execution cap must not
/// have been reached.
pub fn can_execute_on(rule: &RecurrenceRule, candidate_date: Date) -> bool {
    if !rule.is_operationally_active() {
        return false;
    }

    if candidate_date < rule.start_date {
        return false;
    }

    if rule
        .end_date
        .is_some_and(|end_date| candidate_date > end_date)
    {
        return false;
    }

    if rule
        .max_executions
        .is_some_and(|max_executions| rule.total_executions >= max_executions)
    {
        return false;
    }

    true
}

/// List the occurrences `rule` would produce between `from` and `until`
/// (both inclusive), at most `limit` of them.
///
/// Projection starts from the rule's pending `next_execution_date`, or its
/// start date if nothing is pending. Occurrences before `from` are simulated
/// as executed so that the execution cap is honoured.
pub fn upcoming_occurrences(
    rule: &RecurrenceRule,
    from: Date,
    until: Date,
    limit: usize,
) -> Vec<Date> {
    let mut projected = rule.clone();
    let mut occurrences = Vec::new();
    let mut pending = rule.next_execution_date.or(Some(rule.start_date));

    for _ in 0..MAX_PROJECTION_STEPS {
        let Some(occurrence) = pending else {
            break;
        };

        if occurrences.len() >= limit || occurrence > until {
            break;
        }

        if !can_execute_on(&projected, occurrence) {
            break;
        }

        if occurrence >= from {
            occurrences.push(occurrence);
        }

        projected.total_executions += 1;
        projected.last_execution_date = Some(occurrence);
        pending = compute_next_occurrence(&projected, Some(occurrence));
    }

    occurrences
}



#[cfg(test)]
mod upcoming_occurrences_tests {
    use time::macros::date;

    use crate::recurrence::{DayOfMonth, Frequency, Interval, RecurrenceRule};

    use super::upcoming_occurrences;

    #[test]
    fn lists_occurrences_in_window() {
        let rule = RecurrenceRule::new(Frequency::Monthly, Interval::ONE, date!(2024 - 01 - 31))
            .day_of_month(Some(DayOfMonth::new(31).unwrap()));

        let got = upcoming_occurrences(&rule, date!(2024 - 01 - 01), date!(2024 - 05 - 01), 10);

        assert_eq!(
            got,
            vec![
                date!(2024 - 01 - 31),
                date!(2024 - 02 - 29),
                date!(2024 - 03 - 31),
                date!(2024 - 04 - 30),
            ]
        );
    }

    #[test]
    fn skips_occurrences_before_window() {
        let rule = RecurrenceRule::new(Frequency::Daily, Interval::ONE, date!(2024 - 01 - 01));

        let got = upcoming_occurrences(&rule, date!(2024 - 01 - 05), date!(2024 - 01 - 07), 10);

        assert_eq!(
            got,
            vec![
                date!(2024 - 01 - 05),
                date!(2024 - 01 - 06),
                date!(2024 - 01 - 07),
            ]
        );
    }

    #[test]
    fn stops_at_execution_cap() {
        let mut rule = RecurrenceRule::new(Frequency::Weekly, Interval::ONE, date!(2024 - 01 - 01))
            .max_executions(Some(3))
            .unwrap();
        rule.total_executions = 1;
        rule.next_execution_date = Some(date!(2024 - 01 - 08));

        let got = upcoming_occurrences(&rule, date!(2024 - 01 - 01), date!(2024 - 12 - 31), 10);

        assert_eq!(got, vec![date!(2024 - 01 - 08), date!(2024 - 01 - 15)]);
    }

    #[test]
    fn stops_at_end_date() {
        let rule = RecurrenceRule::new(Frequency::Yearly, Interval::ONE, date!(2024 - 02 - 29))
            .end_date(Some(date!(2026 - 06 - 01)))
            .unwrap();

        let got = upcoming_occurrences(&rule, date!(2024 - 01 - 01), date!(2030 - 01 - 01), 10);

        assert_eq!(
            got,
            vec![
                date!(2024 - 02 - 29),
                date!(2025 - 02 - 28),
                date!(2026 - 02 - 28),
            ]
        );
    }

    #[test]
    fn respects_limit() {
        let rule = RecurrenceRule::new(Frequency::Daily, Interval::ONE, date!(2024 - 01 - 01));

        let got = upcoming_occurrences(&rule, date!(2024 - 01 - 01), date!(2024 - 12 - 31), 2);

        assert_eq!(got, vec![date!(2024 - 01 - 01), date!(2024 - 01 - 02)]);
    }

    #[test]
    fn finished_rule_has_nothing_upcoming() {
        let mut rule = RecurrenceRule::new(Frequency::Daily, Interval::ONE, date!(2024 - 01 - 01));
        rule.status = crate::recurrence::RuleStatus::Completed;
        rule.next_execution_date = None;

        let got = upcoming_occurrences(&rule, date!(2024 - 01 - 01), date!(2024 - 12 - 31), 10);

        assert!(got.is_empty());
    }
}
