use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    category::{
        core::{CategoryId, delete_category},
        create::CategoryState,
    },
};

/// A route handler for deleting a category.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(_) => (
            StatusCode::OK,
            Alert::SuccessSimple {
                message: "Category deleted successfully".to_owned(),
            }
            .into_html(),
        )
            .into_response(),
        Err(Error::DeleteMissingCategory) => Error::DeleteMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
