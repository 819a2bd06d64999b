//! Budget creation page and endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, Query};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Month;

use crate::{
    Error,
    budget::{
        budgets_page::{BudgetQuery, BudgetState, month_url},
        core::{BudgetMonth, MAX_BUDGET_YEAR, MIN_BUDGET_YEAR, create_budget},
    },
    category::{Category, CategoryId, CategoryKind, get_all_categories, get_category},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base,
    },
    navigation::NavBar,
    timezone::local_today,
};

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// The form data for creating a budget.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetForm {
    pub category_id: CategoryId,
    pub year: i32,
    /// The month number, 1 for January.
    pub month: u8,
    pub amount: f64,
}

impl BudgetForm {
    fn blank(month: BudgetMonth) -> Self {
        Self {
            category_id: 0,
            year: month.year(),
            month: month.month_number(),
            amount: 0.0,
        }
    }
}

/// Route handler for the new budget page, preset to the month in the query.
pub async fn get_new_budget_page(
    State(state): State<BudgetState>,
    Query(query): Query<BudgetQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let month = query.selected_month(today);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_expense_categories(&connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve categories for new budget page: {error}")
    })?;

    Ok(new_budget_view(&categories, &BudgetForm::blank(month)).into_response())
}

/// A route handler for creating a budget, redirects to the budget's month on success.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let re_render = |error_message: &str| {
        let categories = get_expense_categories(&connection).unwrap_or_default();
        budget_form_view(&categories, &form, error_message).into_response()
    };

    let month = match BudgetMonth::new(form.year, form.month) {
        Ok(month) => month,
        Err(error_message) => return re_render(&error_message),
    };

    if !form.amount.is_finite() || form.amount <= 0.0 {
        return re_render("Error: Amount must be greater than zero");
    }

    match get_category(form.category_id, &connection) {
        Ok(category) if category.kind == CategoryKind::Income => {
            return re_render("Error: Budgets can only be set for expense categories");
        }
        Ok(_) => {}
        Err(Error::NotFound) => {
            return Error::InvalidCategory(Some(form.category_id)).into_alert_response();
        }
        Err(error) => {
            tracing::error!("could not get category #{}: {error}", form.category_id);
            return error.into_alert_response();
        }
    }

    match create_budget(form.category_id, month, form.amount, &connection) {
        Ok(budget) => {
            tracing::info!(
                "created budget #{} for category #{} in {}",
                budget.id,
                budget.category_id,
                month.label()
            );

            (HxRedirect(month_url(month)), StatusCode::SEE_OTHER).into_response()
        }
        Err(error @ (Error::DuplicateBudget | Error::InvalidCategory(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a budget: {error}");
            error.into_alert_response()
        }
    }
}

fn get_expense_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    get_all_categories(connection).map(|categories| {
        categories
            .into_iter()
            .filter(|category| category.kind == CategoryKind::Expense)
            .collect()
    })
}

fn new_budget_view(categories: &[Category], form: &BudgetForm) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_BUDGET_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Budget" }

            @if categories.is_empty() {
                p
                {
                    "Budgets limit spending in an expense category. "
                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                    {
                        "Create an expense category"
                    }
                    " first."
                }
            } @else {
                (budget_form_view(categories, form, ""))
            }
        }
    };

    base("Create Budget", &content)
}

fn budget_form_view(categories: &[Category], form: &BudgetForm, error_message: &str) -> Markup {
    let amount = (form.amount > 0.0).then(|| format!("{:.2}", form.amount));

    html! {
        form
            hx-post=(endpoints::POST_BUDGET)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select id="category_id" name="category_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in categories {
                        option value=(category.id) selected[form.category_id == category.id]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div class="grid grid-cols-2 gap-4"
            {
                div
                {
                    label for="month" class=(FORM_LABEL_STYLE) { "Month" }

                    select id="month" name="month" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for month in MONTHS {
                            option
                                value=(u8::from(month))
                                selected[form.month == u8::from(month)]
                            {
                                (month)
                            }
                        }
                    }
                }

                div
                {
                    label for="year" class=(FORM_LABEL_STYLE) { "Year" }

                    input
                        id="year"
                        type="number"
                        name="year"
                        min=(MIN_BUDGET_YEAR)
                        max=(MAX_BUDGET_YEAR)
                        value=(form.year)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="0.01"
                    min="0.01"
                    value=[amount]
                    placeholder="0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Budget" }
        }
    }
}


#[cfg(test)]
mod create_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;

    use crate::{
        budget::{
            budgets_page::BudgetState,
            core::{BudgetMonth, get_budget_progress},
        },
        category::{Category, CategoryKind, CategoryName, create_category},
        test_utils::{
            assert_alert_contains, assert_form_error_message, assert_hx_redirect,
            get_test_connection, must_get_form, parse_html_fragment,
        },
    };

    use super::{BudgetForm, create_budget_endpoint};

    fn state_with_category(kind: CategoryKind) -> (BudgetState, Category) {
        let connection = get_test_connection();
        let category =
            create_category(&CategoryName::new("Groceries").unwrap(), kind, &connection).unwrap();
        let state = BudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, category)
    }

    fn form(category: &Category) -> BudgetForm {
        BudgetForm {
            category_id: category.id,
            year: 2025,
            month: 3,
            amount: 500.0,
        }
    }

    #[tokio::test]
    async fn can_create_budget() {
        let (state, groceries) = state_with_category(CategoryKind::Expense);

        let response = create_budget_endpoint(State(state.clone()), Form(form(&groceries))).await;

        assert_hx_redirect(&response, "/budgets?year=2025&month=3");
        let progress = get_budget_progress(
            BudgetMonth::new(2025, 3).unwrap(),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].budget.amount, 500.0);
    }

    #[tokio::test]
    async fn invalid_values_re_render_form() {
        let (state, groceries) = state_with_category(CategoryKind::Expense);

        for (form, want_error) in [
            (
                BudgetForm {
                    amount: 0.0,
                    ..form(&groceries)
                },
                "Error: Amount must be greater than zero",
            ),
            (
                BudgetForm {
                    month: 13,
                    ..form(&groceries)
                },
                "Error: Month must be between 1 and 12",
            ),
        ] {
            let response = create_budget_endpoint(State(state.clone()), Form(form)).await;

            assert_eq!(response.status(), StatusCode::OK);
            let html = parse_html_fragment(response).await;
            let form = must_get_form(&html);
            assert_form_error_message(&form, want_error);
        }
    }

    #[tokio::test]
    async fn income_category_is_rejected() {
        let (state, wages) = state_with_category(CategoryKind::Income);

        let response = create_budget_endpoint(State(state), Form(form(&wages))).await;

        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(
            &form,
            "Error: Budgets can only be set for expense categories",
        );
    }

    #[tokio::test]
    async fn duplicate_budget_shows_alert() {
        let (state, groceries) = state_with_category(CategoryKind::Expense);
        create_budget_endpoint(State(state.clone()), Form(form(&groceries))).await;

        let response = create_budget_endpoint(State(state), Form(form(&groceries))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_alert_contains(&html, "Duplicate Budget");
    }

    #[tokio::test]
    async fn unknown_category_shows_alert() {
        let (state, groceries) = state_with_category(CategoryKind::Expense);
        let form = BudgetForm {
            category_id: groceries.id + 1,
            ..form(&groceries)
        };

        let response = create_budget_endpoint(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_alert_contains(&html, "Invalid category");
    }
}
