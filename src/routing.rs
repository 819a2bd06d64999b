//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{create_account_endpoint, get_accounts_page, get_new_account_page},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budgets_page, get_new_budget_page,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_new_category_page,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    recurring::{
        create_rule_endpoint, delete_rule_endpoint, get_edit_rule_page, get_new_rule_page,
        get_recurring_rules_page, get_upcoming_page, run_due_rules_endpoint, update_rule_endpoint,
        update_rule_status_endpoint,
    },
    transaction::get_transactions_page,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::RECURRING_VIEW, get(get_recurring_rules_page))
        .route(endpoints::NEW_RECURRING_VIEW, get(get_new_rule_page))
        .route(endpoints::EDIT_RECURRING_VIEW, get(get_edit_rule_page))
        .route(endpoints::UPCOMING_VIEW, get(get_upcoming_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::NEW_BUDGET_VIEW, get(get_new_budget_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_new_account_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(endpoints::POST_RECURRING, post(create_rule_endpoint))
        .route(endpoints::RUN_DUE_RULES, post(run_due_rules_endpoint))
        .route(
            endpoints::RECURRING_RULE,
            put(update_rule_endpoint).delete(delete_rule_endpoint),
        )
        .route(
            endpoints::RECURRING_STATUS,
            post(update_rule_status_endpoint),
        )
        .route(endpoints::POST_ACCOUNT, post(create_account_endpoint))
        .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .route(endpoints::POST_BUDGET, post(create_budget_endpoint))
        .route(endpoints::BUDGET, delete(delete_budget_endpoint));

    page_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the recurring rules page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::RECURRING_VIEW)
}
