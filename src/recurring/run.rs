//! Turns due occurrences of recurring rules into transactions.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    recurrence::{StatusAction, can_execute_on, compute_next_occurrence},
    recurring::{
        db::{get_due_rules, record_execution, update_rule_status},
        models::{RecurringRule, RuleId},
    },
    transaction::{Transaction, TransactionId, create_transaction},
};

/// Options for [run_due_rules].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Compute the summary without saving anything.
    pub dry_run: bool,
    /// Only run these rules, or every due rule if `None`.
    pub rule_ids: Option<Vec<RuleId>>,
    /// The most occurrences materialized per rule in one run.
    pub max_catch_up: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            rule_ids: None,
            max_catch_up: 366,
        }
    }
}

/// One occurrence that was turned into a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRecord {
    /// The rule the occurrence belongs to.
    pub rule_id: RuleId,
    /// The date of the occurrence and the transaction.
    pub date: Date,
    /// The amount of the transaction, copied from the rule.
    pub amount: f64,
    /// The transaction description, the rule's description template.
    pub description: String,
    /// The created transaction, `None` for dry runs.
    pub transaction_id: Option<TransactionId>,
}

/// The outcome of [run_due_rules].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Occurrences on or before this date were due.
    pub as_of: Date,
    /// Whether the run was rolled back.
    pub dry_run: bool,
    /// The number of due rules that were looked at.
    pub total_rules: usize,
    /// The number of rules that created at least one transaction.
    pub rules_executed: usize,
    /// The number of occurrences turned into transactions.
    pub transactions_created: usize,
    /// One message per rule that failed. Failed rules are left untouched.
    pub errors: Vec<String>,
    /// Every occurrence turned into a transaction, in the order they were created.
    pub executions: Vec<ExecutionRecord>,
}

/// Create the transactions for every occurrence of a due rule up to and
/// including `as_of`.
///
/// Missed occurrences are caught up, at most `options.max_catch_up` per rule.
/// Rules that have expired or have no further occurrence are marked
/// completed. A rule that fails is rolled back and reported in
/// [RunSummary::errors] without stopping the other rules.
///
/// Everything runs in one immediate SQL transaction, which is rolled back on
/// a dry run.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL transaction cannot be started,
/// the due rules cannot be read, or the result cannot be committed.
pub fn run_due_rules(
    connection: &Connection,
    as_of: Date,
    options: &RunOptions,
) -> Result<RunSummary, Error> {
    let mut transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let rules: Vec<RecurringRule> = get_due_rules(as_of, &transaction)?
        .into_iter()
        .filter(|rule| {
            options
                .rule_ids
                .as_ref()
                .is_none_or(|rule_ids| rule_ids.contains(&rule.id))
        })
        .collect();

    let mut summary = RunSummary {
        as_of,
        dry_run: options.dry_run,
        total_rules: rules.len(),
        rules_executed: 0,
        transactions_created: 0,
        errors: Vec::new(),
        executions: Vec::new(),
    };

    for rule in &rules {
        let savepoint = transaction.savepoint()?;

        match execute_rule(rule, as_of, options, &savepoint) {
            Ok(executions) => {
                savepoint.commit()?;

                if !executions.is_empty() {
                    summary.rules_executed += 1;
                }
                summary.transactions_created += executions.len();
                summary.executions.extend(executions);
            }
            Err(error) => {
                tracing::error!("could not run recurring rule #{}: {error}", rule.id);
                summary
                    .errors
                    .push(format!("Rule #{} ({}): {error}", rule.id, rule.name));
            }
        }
    }

    if options.dry_run {
        transaction.rollback()?;
    } else {
        transaction.commit()?;
    }

    tracing::info!(
        "ran {} due recurring rules as of {as_of}: {} transactions created, {} errors{}",
        summary.total_rules,
        summary.transactions_created,
        summary.errors.len(),
        if options.dry_run { " (dry run)" } else { "" }
    );

    Ok(summary)
}

fn execute_rule(
    rule: &RecurringRule,
    as_of: Date,
    options: &RunOptions,
    connection: &Connection,
) -> Result<Vec<ExecutionRecord>, Error> {
    let mut schedule = rule.schedule.clone();
    let mut executions = Vec::new();

    while executions.len() < options.max_catch_up as usize {
        let Some(occurrence) = schedule.next_execution_date else {
            break;
        };

        if occurrence > as_of || !can_execute_on(&schedule, occurrence) {
            break;
        }

        let transaction = create_transaction(
            Transaction::build(rule.amount, occurrence, &rule.description_template)
                .account_id(rule.account_id)
                .category_id(rule.category_id)
                .recurring_rule_id(Some(rule.id)),
            connection,
        )?;

        let expected_total_executions = schedule.total_executions;
        schedule.total_executions += 1;
        schedule.last_execution_date = Some(occurrence);
        schedule.next_execution_date = compute_next_occurrence(&schedule, Some(occurrence));

        record_execution(
            rule.id,
            expected_total_executions,
            occurrence,
            schedule.next_execution_date,
            connection,
        )?;

        executions.push(ExecutionRecord {
            rule_id: rule.id,
            date: occurrence,
            amount: rule.amount,
            description: rule.description_template.clone(),
            transaction_id: (!options.dry_run).then_some(transaction.id),
        });
    }

    let finished = match schedule.next_execution_date {
        Some(next_execution_date) => !can_execute_on(&schedule, next_execution_date),
        None => true,
    };

    if finished {
        let status = schedule.status.apply(StatusAction::Complete)?;
        update_rule_status(rule.id, status, None, connection)?;
        tracing::info!("recurring rule #{} completed", rule.id);
    }

    Ok(executions)
}
