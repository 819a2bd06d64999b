//! The 500 page, shown when a page handler fails in a way the user cannot fix.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// What went wrong and what the user can do about it.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl InternalServerError<'_> {
    /// The page for when the shared database connection is unusable, e.g.
    /// after a handler panicked while holding the lock.
    pub fn database_unavailable() -> Self {
        Self {
            description: "The database is unavailable.",
            fix: "Restart the server. If this keeps happening, check the server logs.",
        }
    }
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_view("Internal Server Error", "500", self.description, self.fix),
        )
            .into_response()
    }
}

/// Route handler for the 500 page.
pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}
