use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    account::AccountId,
    app_state::RecurringConfig,
    category::CategoryId,
    database_id::DatabaseId,
    recurrence::{DayOfMonth, DaysOfWeek, Frequency, Interval, RecurrenceRule, RuleStatus},
};

pub type RuleId = DatabaseId;

/// The longest allowed rule name, in characters.
pub const MAX_NAME_LENGTH: usize = 100;
/// The longest allowed description template, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
/// The largest interval accepted from the rule form.
pub const MAX_FORM_INTERVAL: u32 = 12;

/// A recurring transaction: a transaction template plus the schedule on
/// which it repeats.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringRule {
    pub id: RuleId,
    /// A short label, e.g. "Rent".
    pub name: String,
    /// The description given to each transaction the rule creates.
    pub description_template: String,
    /// The amount of each transaction, negative for expenses.
    pub amount: f64,
    /// The account transactions are booked to.
    pub account_id: Option<AccountId>,
    /// The category given to each transaction the rule creates.
    pub category_id: Option<CategoryId>,
    pub notes: Option<String>,
    /// When the rule fires and how often it has fired.
    pub schedule: RecurrenceRule,
}

/// A validated rule that has not been saved yet, or the new values for an
/// existing rule.
///
/// Only the configuration part of `schedule` is used, the execution state
/// (status, counters and dates) is managed by the database functions.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub name: String,
    pub description_template: String,
    pub amount: f64,
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub notes: Option<String>,
    pub schedule: RecurrenceRule,
}

/// Filters for listing rules. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleFilter {
    pub status: Option<RuleStatus>,
    pub frequency: Option<Frequency>,
    pub enabled: Option<bool>,
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
}

/// State for all recurring rule route handlers.
#[derive(Debug, Clone)]
pub struct RecurringState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, used to find today's date.
    pub local_timezone: String,
    pub recurring_config: RecurringConfig,
}

impl FromRef<AppState> for RecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            recurring_config: state.recurring_config,
        }
    }
}

/// Form data for creating and editing rules.
///
/// Deserialized with `axum_extra::extract::Form`, so empty optional fields
/// become `None` and `days_of_week` may repeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleForm {
    pub name: String,
    pub description_template: String,
    pub amount: f64,
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub frequency: Frequency,
    pub interval: u32,
    pub day_of_month: Option<u8>,
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub max_executions: Option<u32>,
    pub notes: Option<String>,
    /// Checkboxes are only submitted when checked.
    #[serde(default)]
    pub enabled: bool,
}

impl RuleForm {
    /// The values for a blank form starting on `start_date`.
    pub fn blank(start_date: Date) -> Self {
        Self {
            name: String::new(),
            description_template: String::new(),
            amount: 0.0,
            account_id: None,
            category_id: None,
            frequency: Frequency::Monthly,
            interval: 1,
            day_of_month: None,
            days_of_week: Vec::new(),
            start_date,
            end_date: None,
            max_executions: None,
            notes: None,
            enabled: true,
        }
    }

    /// Check the form values and turn them into a [RuleDraft].
    ///
    /// `day_of_month` is dropped for daily, weekly and yearly rules and
    /// `days_of_week` for everything but weekly rules.
    ///
    /// # Errors
    /// Returns a message suitable for showing beneath the form.
    pub fn validate(&self) -> Result<RuleDraft, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Error: Name cannot be empty".to_owned());
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(format!(
                "Error: Name cannot be longer than {MAX_NAME_LENGTH} characters"
            ));
        }

        let description_template = self.description_template.trim();
        if description_template.is_empty() {
            return Err("Error: Description cannot be empty".to_owned());
        }
        if description_template.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(format!(
                "Error: Description cannot be longer than {MAX_DESCRIPTION_LENGTH} characters"
            ));
        }

        if !self.amount.is_finite() || self.amount == 0.0 {
            return Err("Error: Amount must be a non-zero number".to_owned());
        }

        if self.interval > MAX_FORM_INTERVAL {
            return Err(format!(
                "Error: The interval cannot be more than {MAX_FORM_INTERVAL}"
            ));
        }

        let schedule = self.schedule().map_err(|error| match error {
            Error::InvalidRecurrence(reason) => format!("Error: {reason}"),
            error => format!("Error: {error}"),
        })?;

        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_owned);

        Ok(RuleDraft {
            name: name.to_owned(),
            description_template: description_template.to_owned(),
            amount: self.amount,
            account_id: self.account_id,
            category_id: self.category_id,
            notes,
            schedule,
        })
    }

    fn schedule(&self) -> Result<RecurrenceRule, Error> {
        let interval = Interval::new(self.interval)?;

        let day_of_month = match self.day_of_month {
            Some(day) if self.frequency.uses_day_of_month() => Some(DayOfMonth::new(day)?),
            _ => None,
        };

        let days_of_week = if self.frequency == Frequency::Weekly && !self.days_of_week.is_empty()
        {
            Some(DaysOfWeek::from_numbers(&self.days_of_week)?)
        } else {
            None
        };

        RecurrenceRule::new(self.frequency, interval, self.start_date)
            .day_of_month(day_of_month)
            .days_of_week(days_of_week)
            .end_date(self.end_date)?
            .max_executions(self.max_executions)
            .map(|schedule| schedule.enabled(self.enabled))
    }
}

impl From<&RecurringRule> for RuleForm {
    fn from(rule: &RecurringRule) -> Self {
        let schedule = &rule.schedule;

        Self {
            name: rule.name.clone(),
            description_template: rule.description_template.clone(),
            amount: rule.amount,
            account_id: rule.account_id,
            category_id: rule.category_id,
            frequency: schedule.frequency,
            interval: schedule.interval.get(),
            day_of_month: schedule.day_of_month.map(DayOfMonth::get),
            days_of_week: schedule
                .days_of_week
                .map(DaysOfWeek::numbers)
                .unwrap_or_default(),
            start_date: schedule.start_date,
            end_date: schedule.end_date,
            max_executions: schedule.max_executions,
            notes: rule.notes.clone(),
            enabled: schedule.enabled,
        }
    }
}
