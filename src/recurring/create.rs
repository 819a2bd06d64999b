use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    recurring::{
        db::create_recurring_rule,
        form::{FormChoices, FormTarget, rule_form_view},
        models::{RecurringState, RuleForm},
    },
    timezone::local_today,
};

/// Route handler for the new recurring rule page.
pub async fn get_new_rule_page(State(state): State<RecurringState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let choices = FormChoices::load(&connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve accounts and categories for new rule page: {error}")
    })?;

    let today = local_today(&state.local_timezone)?;

    Ok(new_rule_view(&RuleForm::blank(today), &choices).into_response())
}

/// A route handler for creating a new recurring rule.
///
/// Invalid form data re-renders the form with an error message.
pub async fn create_rule_endpoint(
    State(state): State<RecurringState>,
    Form(form): Form<RuleForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(error_message) => {
            let choices = FormChoices::load(&connection).unwrap_or_default();

            return rule_form_view(FormTarget::Create, &form, &choices, &error_message)
                .into_response();
        }
    };

    match create_recurring_rule(&draft, &connection) {
        Ok(rule) => {
            tracing::info!("created recurring rule #{} \"{}\"", rule.id, rule.name);

            (
                HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ (Error::InvalidAccount(_) | Error::InvalidCategory(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a recurring rule: {error}");
            error.into_alert_response()
        }
    }
}

fn new_rule_view(form: &RuleForm, choices: &FormChoices) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_RECURRING_VIEW).into_html();
    let form = rule_form_view(FormTarget::Create, form, choices, "");

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Recurring Rule" }

            (form)
        }
    };

    base("Create Recurring Rule", &content)
}
