//! Defines the page and endpoint for creating a new account.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    account::{accounts_page::AccountState, core::create_account},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The longest allowed account name, in characters.
const MAX_ACCOUNT_NAME_LENGTH: usize = 100;

/// The form data for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    /// The account name, e.g. "Everyday".
    pub name: String,
}

/// Renders the page for creating an account.
pub async fn get_new_account_page() -> Response {
    let nav_bar = NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Account" }

            (account_form_view(""))
        }
    };

    base("Create Account", &content).into_response()
}

/// A route handler for creating a new account, redirects to accounts view on success.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Form(form): Form<AccountForm>,
) -> Response {
    let name = form.name.trim();
    if name.is_empty() {
        return account_form_view("Error: Account name cannot be empty").into_response();
    }
    if name.chars().count() > MAX_ACCOUNT_NAME_LENGTH {
        return account_form_view(&format!(
            "Error: Account name cannot be longer than {MAX_ACCOUNT_NAME_LENGTH} characters"
        ))
        .into_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(name, &connection) {
        Ok(account) => {
            tracing::info!("created account #{} \"{}\"", account.id, account.name);

            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateAccountName(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "Could not create account with {form:?}, got an unexpected error: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn account_form_view(error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_ACCOUNT)
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
                label for="name" class=(FORM_LABEL_STYLE) { "Account Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="e.g., Everyday"
                    maxlength=(MAX_ACCOUNT_NAME_LENGTH)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Account" }
        }
    }
}
