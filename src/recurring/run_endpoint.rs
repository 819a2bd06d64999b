use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;

use crate::{
    Error,
    alert::Alert,
    recurring::{
        models::RecurringState,
        run::{RunOptions, RunSummary, run_due_rules},
    },
    timezone::local_today,
};

/// The form data for running due rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RunForm {
    /// Report what would happen without creating transactions.
    #[serde(default)]
    pub dry_run: bool,
}

/// A route handler that creates the transactions for every occurrence due
/// on or before today.
pub async fn run_due_rules_endpoint(
    State(state): State<RecurringState>,
    Form(form): Form<RunForm>,
) -> Response {
    let start_time = std::time::Instant::now();

    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let options = RunOptions {
        dry_run: form.dry_run,
        rule_ids: None,
        max_catch_up: state.recurring_config.max_catch_up,
    };

    match run_due_rules(&connection, today, &options) {
        Ok(summary) => {
            tracing::info!(
                "Running due rules took {:.2}ms",
                start_time.elapsed().as_millis()
            );

            (StatusCode::OK, summary_alert(&summary).into_html()).into_response()
        }
        Err(error) => {
            tracing::error!("Failed to run due rules: {error}");
            error.into_alert_response()
        }
    }
}

fn summary_alert(summary: &RunSummary) -> Alert {
    let verb = if summary.dry_run {
        "would be created"
    } else {
        "created"
    };
    let details = format!(
        "{} transactions {verb} from {} of {} due rules.",
        summary.transactions_created, summary.rules_executed, summary.total_rules
    );

    if !summary.errors.is_empty() {
        return Alert::Error {
            message: format!("{} rules could not be run", summary.errors.len()),
            details: format!("{details} {}", summary.errors.join(" ")),
        };
    }

    let message = match (summary.dry_run, summary.total_rules) {
        (_, 0) => "No rules are due".to_owned(),
        (true, _) => "Dry run completed".to_owned(),
        (false, _) => "Due rules completed".to_owned(),
    };

    Alert::Success { message, details }
}
