//! Pausing, resuming and cancelling rules.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    recurrence::{
        RecurrenceRule, RuleStatus, StatusAction, can_execute_on, compute_next_occurrence,
    },
    recurring::{
        db::{get_recurring_rule, update_rule_status},
        models::{RecurringRule, RuleId},
    },
};

/// Apply `action` to the rule `id` and save the result.
///
/// Pausing keeps the pending occurrence. Cancelling and completing clear it.
/// Resuming skips the occurrences that fell due while the rule was paused,
/// without creating transactions for them, and completes the rule if no
/// occurrence is left.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if there is no rule with `id`,
/// - [Error::InvalidStatusTransition] if `action` is not allowed from the
///   rule's status,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn change_rule_status(
    id: RuleId,
    action: StatusAction,
    today: Date,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    let rule = get_recurring_rule(id, connection)?;
    let status = rule.schedule.status.apply(action)?;

    let (status, next_execution_date) = match action {
        StatusAction::Pause => (status, rule.schedule.next_execution_date),
        StatusAction::Resume => match first_occurrence_from(&rule.schedule, today) {
            Some(next_execution_date) => (status, Some(next_execution_date)),
            None => (RuleStatus::Completed, None),
        },
        StatusAction::Cancel | StatusAction::Complete => (status, None),
    };

    tracing::info!(
        "recurring rule #{id} changed from {} to {status}",
        rule.schedule.status
    );

    update_rule_status(id, status, next_execution_date, connection)
}

/// The first occurrence of `schedule` on or after `today`, if the rule can
/// still fire then.
fn first_occurrence_from(schedule: &RecurrenceRule, today: Date) -> Option<Date> {
    let mut resumed = schedule.clone();
    resumed.status = RuleStatus::Active;
    resumed.enabled = true;

    let mut pending = schedule.next_execution_date.unwrap_or(schedule.start_date);

    while pending < today {
        pending = compute_next_occurrence(&resumed, Some(pending))?;
    }

    can_execute_on(&resumed, pending).then_some(pending)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        recurrence::{Frequency, RuleStatus, StatusAction},
        recurring::{
            db::{create_recurring_rule, get_recurring_rule},
            models::RuleForm,
        },
    };

    use super::change_rule_status;

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn monthly_form() -> RuleForm {
        RuleForm {
            name: "Rent".to_owned(),
            description_template: "Rent payment".to_owned(),
            amount: -450.0,
            frequency: Frequency::Monthly,
            ..RuleForm::blank(date!(2025 - 01 - 01))
        }
    }

    #[test]
    fn pause_keeps_pending_occurrence() {
        let connection = get_test_connection();
        let rule = create_recurring_rule(&monthly_form().validate().unwrap(), &connection).unwrap();

        let paused = change_rule_status(
            rule.id,
            StatusAction::Pause,
            date!(2025 - 01 - 01),
            &connection,
        )
        .unwrap();

        assert_eq!(paused.schedule.status, RuleStatus::Paused);
        assert_eq!(
            paused.schedule.next_execution_date,
            Some(date!(2025 - 01 - 01))
        );
    }

    #[test]
    fn resume_skips_occurrences_missed_while_paused() {
        let connection = get_test_connection();
        let rule = create_recurring_rule(&monthly_form().validate().unwrap(), &connection).unwrap();
        change_rule_status(
            rule.id,
            StatusAction::Pause,
            date!(2025 - 01 - 01),
            &connection,
        )
        .unwrap();

        let resumed = change_rule_status(
            rule.id,
            StatusAction::Resume,
            date!(2025 - 04 - 15),
            &connection,
        )
        .unwrap();

        assert_eq!(resumed.schedule.status, RuleStatus::Active);
        assert_eq!(
            resumed.schedule.next_execution_date,
            Some(date!(2025 - 05 - 01))
        );
        assert_eq!(resumed.schedule.total_executions, 0);
    }

    #[test]
    fn resume_past_end_date_completes_rule() {
        let connection = get_test_connection();
        let form = RuleForm {
            end_date: Some(date!(2025 - 03 - 31)),
            ..monthly_form()
        };
        let rule = create_recurring_rule(&form.validate().unwrap(), &connection).unwrap();
        change_rule_status(
            rule.id,
            StatusAction::Pause,
            date!(2025 - 01 - 01),
            &connection,
        )
        .unwrap();

        let resumed = change_rule_status(
            rule.id,
            StatusAction::Resume,
            date!(2025 - 06 - 01),
            &connection,
        )
        .unwrap();

        assert_eq!(resumed.schedule.status, RuleStatus::Completed);
        assert_eq!(resumed.schedule.next_execution_date, None);
    }

    #[test]
    fn cancel_clears_pending_occurrence() {
        let connection = get_test_connection();
        let rule = create_recurring_rule(&monthly_form().validate().unwrap(), &connection).unwrap();

        let cancelled = change_rule_status(
            rule.id,
            StatusAction::Cancel,
            date!(2025 - 01 - 01),
            &connection,
        )
        .unwrap();

        assert_eq!(cancelled.schedule.status, RuleStatus::Cancelled);
        assert_eq!(cancelled.schedule.next_execution_date, None);
    }

    #[test]
    fn invalid_transition_leaves_rule_unchanged() {
        let connection = get_test_connection();
        let rule = create_recurring_rule(&monthly_form().validate().unwrap(), &connection).unwrap();

        let result = change_rule_status(
            rule.id,
            StatusAction::Resume,
            date!(2025 - 01 - 01),
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::InvalidStatusTransition {
                from: RuleStatus::Active,
                action: StatusAction::Resume,
            })
        );
        assert_eq!(get_recurring_rule(rule.id, &connection), Ok(rule));
    }

    #[test]
    fn missing_rule_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            change_rule_status(1, StatusAction::Pause, date!(2025 - 01 - 01), &connection),
            Err(Error::NotFound)
        );
    }
}
