//! Cadence is a web app for tracking transactions that repeat on a schedule.
//!
//! The core of the library is the [recurrence] engine, which works out when a
//! recurring rule fires next and whether it may still fire at all. Around it,
//! the library stores accounts, categories, rules, transactions and monthly
//! budgets in SQLite, turns due occurrences into transactions with
//! [run_due_rules] and serves HTML pages over HTTP.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod budget;
mod category;
mod database_id;
mod db;
mod endpoints;
mod error;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
pub mod recurrence;
mod recurring;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use account::{Account, AccountId, create_account, get_all_accounts};
pub use app_state::{AppState, RecurringConfig};
pub use budget::{BudgetMonth, create_budget};
pub use category::{CategoryKind, CategoryName, create_category};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use recurring::{
    ExecutionRecord, RecurringRule, RuleDraft, RuleForm, RuleId, RunOptions, RunSummary,
    create_recurring_rule, run_due_rules,
};
pub use routing::build_router;
pub use timezone::{get_local_offset, local_today};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
