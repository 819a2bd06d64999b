//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    account::AccountId,
    alert::Alert,
    category::CategoryId,
    internal_server_error::InternalServerError,
    not_found::NotFoundError,
    recurrence::{RuleStatus, StatusAction},
    recurring::RuleId,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A recurrence schedule was given an impossible configuration, e.g. an
    /// interval of zero or an end date before the start date.
    #[error("invalid recurrence: {0}")]
    InvalidRecurrence(String),

    /// The requested status change is not allowed from the rule's current status.
    #[error("cannot {action} a rule that is {from}")]
    InvalidStatusTransition {
        /// The status the rule was in.
        from: RuleStatus,
        /// The action that was rejected.
        action: StatusAction,
    },

    /// The account ID used for a rule or transaction does not refer to an account.
    #[error("the account ID {0:?} does not refer to a valid account")]
    InvalidAccount(Option<AccountId>),

    /// The specified account name already exists in the database.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountName(String),

    /// An empty string was used as a category name.
    #[error("category names cannot be empty")]
    EmptyCategoryName,

    /// A category name was longer than the allowed number of characters.
    #[error("category names cannot be longer than {0} characters")]
    CategoryNameTooLong(usize),

    /// The specified category name already exists in the database.
    #[error("the category \"{0}\" already exists in the database")]
    DuplicateCategoryName(String),

    /// The category ID used for a rule, transaction or budget does not refer to a category.
    #[error("the category ID {0:?} does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// A budget already exists for the category and month.
    #[error("a budget already exists for this category and month")]
    DuplicateBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a recurring rule that does not exist
    #[error("tried to update a recurring rule that is not in the database")]
    UpdateMissingRule,

    /// Tried to delete a recurring rule that does not exist
    #[error("tried to delete a recurring rule that is not in the database")]
    DeleteMissingRule,

    /// The execution counter of a rule changed between reading the rule and
    /// recording an execution.
    ///
    /// The occurrence was not recorded and the rule should be read again.
    #[error("recurring rule #{0} was modified while it was being executed")]
    ConcurrentRuleUpdate(RuleId),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::database_unavailable().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::InvalidRecurrence(reason) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid schedule".to_owned(),
                    details: capitalize(&reason),
                },
            ),
            Error::InvalidStatusTransition { from, action } => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: format!("Could not {action} rule"),
                    details: format!(
                        "The rule is {from}. Try refreshing the page to see its current status."
                    ),
                },
            ),
            Error::InvalidAccount(account_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid account".to_owned(),
                    details: match account_id {
                        Some(account_id) => {
                            format!("Could not find an account with the ID {account_id}")
                        }
                        None => "Could not find the selected account".to_owned(),
                    },
                },
            ),
            Error::DuplicateAccountName(name) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Account Name".to_owned(),
                    details: format!(
                        "The account {name} already exists in the database. \
                        Choose a different account name, or edit or delete the existing account.",
                    ),
                },
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: match category_id {
                        Some(category_id) => {
                            format!("Could not find a category with the ID {category_id}")
                        }
                        None => "Could not find the selected category".to_owned(),
                    },
                },
            ),
            Error::DuplicateCategoryName(name) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Category Name".to_owned(),
                    details: format!(
                        "The category {name} already exists. Choose a different category name."
                    ),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DuplicateBudget => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Budget".to_owned(),
                    details: "This category already has a budget for that month. \
                        Delete the existing budget first to replace it."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingBudget => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete budget".to_owned(),
                    details: "The budget could not be found. \
                    Try refreshing the page to see if the budget has already been deleted."
                        .to_owned(),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::ErrorSimple {
                    message: "The requested resource could not be found".to_owned(),
                },
            ),
            Error::UpdateMissingRule => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update recurring rule".to_owned(),
                    details: "The recurring rule could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingRule => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete recurring rule".to_owned(),
                    details: "The recurring rule could not be found. \
                    Try refreshing the page to see if the rule has already been deleted."
                        .to_owned(),
                },
            ),
            Error::ConcurrentRuleUpdate(rule_id) => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Recurring rule changed".to_owned(),
                    details: format!(
                        "Recurring rule #{rule_id} was modified while it was being executed. \
                        Try running the due rules again."
                    ),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        Error,
        recurrence::{RuleStatus, StatusAction},
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[tokio::test]
    async fn invalid_transition_is_a_conflict() {
        let response = Error::InvalidStatusTransition {
            from: RuleStatus::Cancelled,
            action: StatusAction::Resume,
        }
        .into_alert_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Could not resume rule"), "got {text}");
        assert!(text.contains("The rule is cancelled."), "got {text}");
    }

    #[tokio::test]
    async fn invalid_recurrence_is_a_bad_request() {
        let response =
            Error::InvalidRecurrence("the interval must be at least 1".to_owned())
                .into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("The interval must be at least 1"), "got {text}");
    }
}
