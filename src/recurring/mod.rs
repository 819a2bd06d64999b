//! Recurring rules: transaction templates that repeat on a schedule.
//!
//! A rule pairs a transaction template (description, amount, account) with a
//! [RecurrenceRule](crate::recurrence::RecurrenceRule). [run_due_rules] turns
//! the occurrences that have fallen due into transactions, and the route
//! handlers here let users manage rules and preview what is coming up.

mod create;
mod db;
mod delete;
mod edit;
mod form;
mod lifecycle;
mod list;
mod models;
mod run;
mod run_endpoint;
mod status;
mod upcoming;

pub use create::{create_rule_endpoint, get_new_rule_page};
pub use db::{
    create_recurring_rule, create_recurring_rule_table, get_recurring_rule, get_recurring_rules,
};
pub use delete::delete_rule_endpoint;
pub use edit::{get_edit_rule_page, update_rule_endpoint};
pub use lifecycle::change_rule_status;
pub use list::get_recurring_rules_page;
pub use models::{RecurringRule, RecurringState, RuleDraft, RuleFilter, RuleForm, RuleId};
pub use run::{ExecutionRecord, RunOptions, RunSummary, run_due_rules};
pub use run_endpoint::run_due_rules_endpoint;
pub use status::update_rule_status_endpoint;
pub use upcoming::get_upcoming_page;
