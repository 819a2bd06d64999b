//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/recurring/{rule_id}/edit', use [format_endpoint].

/// The root route which redirects to the recurring rules page.
pub const ROOT: &str = "/";
/// The page for listing recurring rules.
pub const RECURRING_VIEW: &str = "/recurring";
/// The page for creating a new recurring rule.
pub const NEW_RECURRING_VIEW: &str = "/recurring/new";
/// The page for editing an existing recurring rule.
pub const EDIT_RECURRING_VIEW: &str = "/recurring/{rule_id}/edit";
/// The page listing the occurrences due over the coming days.
pub const UPCOMING_VIEW: &str = "/recurring/upcoming";
/// The page listing transactions, newest first.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for listing accounts and their balances.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for creating a new account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page for listing categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page comparing a month's budgets with spending.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page for creating a new budget.
pub const NEW_BUDGET_VIEW: &str = "/budgets/new";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create a recurring rule.
pub const POST_RECURRING: &str = "/api/recurring";
/// The route to update or delete a recurring rule.
pub const RECURRING_RULE: &str = "/api/recurring/{rule_id}";
/// The route to pause, resume or cancel a recurring rule.
pub const RECURRING_STATUS: &str = "/api/recurring/{rule_id}/status";
/// The route to turn due occurrences into transactions.
pub const RUN_DUE_RULES: &str = "/api/recurring/run";
/// The route to create an account.
pub const POST_ACCOUNT: &str = "/api/accounts";
/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";
/// The route to delete a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to create a budget.
pub const POST_BUDGET: &str = "/api/budgets";
/// The route to delete a budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/recurring/{rule_id}/edit', '{rule_id}'
/// is the parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::RECURRING_VIEW,
            endpoints::NEW_RECURRING_VIEW,
            endpoints::EDIT_RECURRING_VIEW,
            endpoints::UPCOMING_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::ACCOUNTS_VIEW,
            endpoints::NEW_ACCOUNT_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::NEW_CATEGORY_VIEW,
            endpoints::BUDGETS_VIEW,
            endpoints::NEW_BUDGET_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::POST_RECURRING,
            endpoints::RECURRING_RULE,
            endpoints::RECURRING_STATUS,
            endpoints::RUN_DUE_RULES,
            endpoints::POST_ACCOUNT,
            endpoints::POST_CATEGORY,
            endpoints::CATEGORY,
            endpoints::POST_BUDGET,
            endpoints::BUDGET,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::RECURRING_STATUS, 42);

        assert_eq!(formatted_path, "/api/recurring/42/status");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
