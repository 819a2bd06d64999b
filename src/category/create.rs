//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::core::{CategoryKind, CategoryName, create_category},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for the category pages and endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub kind: CategoryKind,
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    new_category_view().into_response()
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => {
            return new_category_form_view(&format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(&name, form.kind, &connection) {
        Ok(category) => {
            tracing::info!("created category #{} \"{}\"", category.id, category.name);

            (
                HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateCategoryName(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

fn new_category_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = new_category_form_view("");

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Category" }

            (form)
        }
    };

    base("Create Category", &content)
}

fn new_category_form_view(error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_CATEGORY)
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
                label for="name" class=(FORM_LABEL_STYLE) { "Category Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="e.g., Groceries"
                    maxlength="100"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

                select id="kind" name="kind" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for kind in CategoryKind::ALL {
                        option value=(kind.as_str()) { (kind.display_name()) }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
        }
    }
}


#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;

    use crate::{
        category::core::{CategoryKind, get_all_categories},
        endpoints,
        test_utils::{
            assert_alert_contains, assert_form_error_message, assert_hx_redirect,
            assert_valid_html, get_test_connection, must_get_form, parse_html_fragment,
        },
    };

    use super::{CategoryForm, CategoryState, create_category_endpoint};

    fn get_category_state() -> CategoryState {
        CategoryState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    fn groceries() -> CategoryForm {
        CategoryForm {
            name: " Groceries ".to_owned(),
            kind: CategoryKind::Expense,
        }
    }

    #[tokio::test]
    async fn can_create_category() {
        let state = get_category_state();

        let response = create_category_endpoint(State(state.clone()), Form(groceries())).await;

        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let categories = get_all_categories(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Groceries");
        assert_eq!(categories[0].kind, CategoryKind::Expense);
    }

    #[tokio::test]
    async fn blank_name_re_renders_form() {
        let form = CategoryForm {
            name: "  ".to_owned(),
            ..groceries()
        };

        let response = create_category_endpoint(State(get_category_state()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: category names cannot be empty");
    }

    #[tokio::test]
    async fn duplicate_name_shows_alert() {
        let state = get_category_state();
        create_category_endpoint(State(state.clone()), Form(groceries())).await;

        let response = create_category_endpoint(State(state), Form(groceries())).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_alert_contains(&html, "Duplicate Category Name");
    }
}
