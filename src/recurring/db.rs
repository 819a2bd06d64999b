//! Database queries for recurring rules.

use rusqlite::{
    Connection, Row, named_params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use time::Date;

use crate::{
    Error,
    category::foreign_key_error,
    recurrence::{DayOfMonth, DaysOfWeek, Frequency, Interval, RecurrenceRule, RuleStatus},
    recurring::models::{RecurringRule, RuleDraft, RuleFilter, RuleId},
};

const RULE_COLUMNS: &str = "id, name, description_template, amount, account_id, category_id, \
    notes, frequency, repeat_interval, day_of_month, days_of_week, start_date, end_date, status, \
    enabled, total_executions, max_executions, last_execution_date, next_execution_date";

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

impl ToSql for RuleStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RuleStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

impl ToSql for Interval {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.get()))
    }
}

impl FromSql for Interval {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let periods = u32::column_result(value)?;
        Interval::new(periods).map_err(|_| FromSqlError::OutOfRange(periods.into()))
    }
}

impl ToSql for DayOfMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.get()))
    }
}

impl FromSql for DayOfMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let day = u8::column_result(value)?;
        DayOfMonth::new(day).map_err(|_| FromSqlError::OutOfRange(day.into()))
    }
}

impl ToSql for DaysOfWeek {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.bits()))
    }
}

impl FromSql for DaysOfWeek {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let bits = u8::column_result(value)?;
        DaysOfWeek::from_bits(bits).map_err(|_| FromSqlError::OutOfRange(bits.into()))
    }
}

/// Create the recurring rule table.
///
/// Weekdays are stored as a 7-bit mask and dates as ISO 8601 text.
pub fn create_recurring_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_rule (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description_template TEXT NOT NULL,
            amount REAL NOT NULL,
            account_id INTEGER,
            category_id INTEGER,
            notes TEXT,
            frequency TEXT NOT NULL,
            repeat_interval INTEGER NOT NULL CHECK (repeat_interval >= 1),
            day_of_month INTEGER CHECK (day_of_month BETWEEN 1 AND 31),
            days_of_week INTEGER CHECK (days_of_week BETWEEN 1 AND 127),
            start_date TEXT NOT NULL,
            end_date TEXT,
            status TEXT NOT NULL DEFAULT 'active',
            enabled INTEGER NOT NULL DEFAULT 1,
            total_executions INTEGER NOT NULL DEFAULT 0,
            max_executions INTEGER CHECK (max_executions >= 1),
            last_execution_date TEXT,
            next_execution_date TEXT,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recurring_rule_next_execution_date
         ON recurring_rule(next_execution_date)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recurring_rule_status ON recurring_rule(status)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recurring_rule_category_id ON recurring_rule(category_id)",
        (),
    )?;

    Ok(())
}

/// Save a new rule. It starts active with its first occurrence pending on
/// the start date.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to a category,
/// - [Error::InvalidAccount] if the account ID does not refer to an account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_recurring_rule(
    draft: &RuleDraft,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    let schedule = &draft.schedule;

    connection
        .prepare(&format!(
            "INSERT INTO recurring_rule (name, description_template, amount, account_id,
                category_id, notes, frequency, repeat_interval, day_of_month, days_of_week,
                start_date, end_date, status, enabled, total_executions, max_executions,
                next_execution_date)
             VALUES (:name, :description_template, :amount, :account_id, :category_id, :notes,
                :frequency, :interval, :day_of_month, :days_of_week, :start_date, :end_date,
                :status, :enabled, 0, :max_executions, :start_date)
             RETURNING {RULE_COLUMNS}"
        ))?
        .query_row(
            named_params! {
                ":name": draft.name,
                ":description_template": draft.description_template,
                ":amount": draft.amount,
                ":account_id": draft.account_id,
                ":category_id": draft.category_id,
                ":notes": draft.notes,
                ":frequency": schedule.frequency,
                ":interval": schedule.interval,
                ":day_of_month": schedule.day_of_month,
                ":days_of_week": schedule.days_of_week,
                ":start_date": schedule.start_date,
                ":end_date": schedule.end_date,
                ":status": RuleStatus::Active,
                ":enabled": schedule.enabled,
                ":max_executions": schedule.max_executions,
            },
            map_rule_row,
        )
        .map_err(|error| map_foreign_key_error(error, draft, connection))
}

/// Retrieve a rule by `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such rule.
pub fn get_recurring_rule(id: RuleId, connection: &Connection) -> Result<RecurringRule, Error> {
    connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_rule_row)
        .map_err(Error::from)
}

/// The rules matching `filter`, sorted by name.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_recurring_rules(
    filter: &RuleFilter,
    connection: &Connection,
) -> Result<Vec<RecurringRule>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule
             WHERE (:status IS NULL OR status = :status)
               AND (:frequency IS NULL OR frequency = :frequency)
               AND (:enabled IS NULL OR enabled = :enabled)
               AND (:account_id IS NULL OR account_id = :account_id)
               AND (:category_id IS NULL OR category_id = :category_id)
             ORDER BY name COLLATE NOCASE, id"
        ))?
        .query_map(
            named_params! {
                ":status": filter.status,
                ":frequency": filter.frequency,
                ":enabled": filter.enabled,
                ":account_id": filter.account_id,
                ":category_id": filter.category_id,
            },
            map_rule_row,
        )?
        .map(|maybe_rule| maybe_rule.map_err(Error::from))
        .collect()
}

/// The enabled, active rules with an occurrence pending on or before `as_of`,
/// earliest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_due_rules(as_of: Date, connection: &Connection) -> Result<Vec<RecurringRule>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rule
             WHERE status = :status
               AND enabled = 1
               AND next_execution_date IS NOT NULL
               AND next_execution_date <= :as_of
             ORDER BY next_execution_date, id"
        ))?
        .query_map(
            named_params! {":status": RuleStatus::Active, ":as_of": as_of},
            map_rule_row,
        )?
        .map(|maybe_rule| maybe_rule.map_err(Error::from))
        .collect()
}

/// Replace the transaction template and schedule of the rule `id`.
///
/// The execution state is kept, except that a rule that has never executed
/// and is not finished has its pending occurrence moved to the new start date.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingRule] if there is no rule with `id`,
/// - [Error::InvalidCategory] if the category ID does not refer to a category,
/// - [Error::InvalidAccount] if the account ID does not refer to an account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_recurring_rule(
    id: RuleId,
    draft: &RuleDraft,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    let schedule = &draft.schedule;

    connection
        .prepare(&format!(
            "UPDATE recurring_rule
             SET name = :name,
                 description_template = :description_template,
                 amount = :amount,
                 account_id = :account_id,
                 category_id = :category_id,
                 notes = :notes,
                 frequency = :frequency,
                 repeat_interval = :interval,
                 day_of_month = :day_of_month,
                 days_of_week = :days_of_week,
                 start_date = :start_date,
                 end_date = :end_date,
                 enabled = :enabled,
                 max_executions = :max_executions,
                 next_execution_date = CASE
                     WHEN total_executions = 0 AND status IN ('active', 'paused')
                     THEN :start_date
                     ELSE next_execution_date
                 END
             WHERE id = :id
             RETURNING {RULE_COLUMNS}"
        ))?
        .query_row(
            named_params! {
                ":id": id,
                ":name": draft.name,
                ":description_template": draft.description_template,
                ":amount": draft.amount,
                ":account_id": draft.account_id,
                ":category_id": draft.category_id,
                ":notes": draft.notes,
                ":frequency": schedule.frequency,
                ":interval": schedule.interval,
                ":day_of_month": schedule.day_of_month,
                ":days_of_week": schedule.days_of_week,
                ":start_date": schedule.start_date,
                ":end_date": schedule.end_date,
                ":enabled": schedule.enabled,
                ":max_executions": schedule.max_executions,
            },
            map_rule_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingRule,
            error => map_foreign_key_error(error, draft, connection),
        })
}

/// Set the status and pending occurrence of the rule `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingRule] if there is no rule with `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_rule_status(
    id: RuleId,
    status: RuleStatus,
    next_execution_date: Option<Date>,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    connection
        .prepare(&format!(
            "UPDATE recurring_rule
             SET status = :status, next_execution_date = :next_execution_date
             WHERE id = :id
             RETURNING {RULE_COLUMNS}"
        ))?
        .query_row(
            named_params! {
                ":id": id,
                ":status": status,
                ":next_execution_date": next_execution_date,
            },
            map_rule_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingRule,
            error => error.into(),
        })
}

/// Record that the occurrence on `execution_date` was materialized.
///
/// The update only applies if the rule still has `expected_total_executions`
/// executions, so two runs cannot both count the same occurrence.
///
/// # Errors
/// This function will return a:
/// - [Error::ConcurrentRuleUpdate] if the counter no longer matches or the
///   rule is gone,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn record_execution(
    id: RuleId,
    expected_total_executions: u32,
    execution_date: Date,
    next_execution_date: Option<Date>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE recurring_rule
         SET total_executions = total_executions + 1,
             last_execution_date = :execution_date,
             next_execution_date = :next_execution_date
         WHERE id = :id AND total_executions = :expected_total_executions",
        named_params! {
            ":id": id,
            ":expected_total_executions": expected_total_executions,
            ":execution_date": execution_date,
            ":next_execution_date": next_execution_date,
        },
    )?;

    if rows_affected == 0 {
        return Err(Error::ConcurrentRuleUpdate(id));
    }

    Ok(())
}

/// Delete the rule `id`. Transactions it created are kept.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingRule] if there is no rule with `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_recurring_rule(id: RuleId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM recurring_rule WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRule);
    }

    Ok(())
}

fn map_foreign_key_error(error: rusqlite::Error, draft: &RuleDraft, connection: &Connection) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => foreign_key_error(draft.account_id, draft.category_id, connection),
        error => error.into(),
    }
}

fn map_rule_row(row: &Row) -> Result<RecurringRule, rusqlite::Error> {
    Ok(RecurringRule {
        id: row.get(0)?,
        name: row.get(1)?,
        description_template: row.get(2)?,
        amount: row.get(3)?,
        account_id: row.get(4)?,
        category_id: row.get(5)?,
        notes: row.get(6)?,
        schedule: RecurrenceRule {
            frequency: row.get(7)?,
            interval: row.get(8)?,
            day_of_month: row.get(9)?,
            days_of_week: row.get(10)?,
            start_date: row.get(11)?,
            end_date: row.get(12)?,
            status: row.get(13)?,
            enabled: row.get(14)?,
            total_executions: row.get(15)?,
            max_executions: row.get(16)?,
            last_execution_date: row.get(17)?,
            next_execution_date: row.get(18)?,
        },
    })
}
