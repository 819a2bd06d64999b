use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    budget::{
        budgets_page::BudgetState,
        core::{BudgetId, delete_budget},
    },
};

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    Path(budget_id): Path<BudgetId>,
    State(state): State<BudgetState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(budget_id, &connection) {
        Ok(_) => (
            StatusCode::OK,
            Alert::SuccessSimple {
                message: "Budget deleted successfully".to_owned(),
            }
            .into_html(),
        )
            .into_response(),
        Err(Error::DeleteMissingBudget) => Error::DeleteMissingBudget.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting budget {budget_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
