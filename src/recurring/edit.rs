use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, FORM_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
    recurring::{
        db::{get_recurring_rule, update_recurring_rule},
        form::{FormChoices, FormTarget, rule_form_view},
        models::{RecurringRule, RecurringState, RuleForm, RuleId},
    },
    transaction::{Transaction, get_transactions_for_rule},
};

/// The number of past transactions shown on the edit page.
const HISTORY_LENGTH: u32 = 10;

/// Route handler for the edit recurring rule page.
pub async fn get_edit_rule_page(
    Path(rule_id): Path<RuleId>,
    State(state): State<RecurringState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rule = get_recurring_rule(rule_id, &connection).inspect_err(|error| match error {
        Error::NotFound => {}
        error => {
            tracing::error!("An unexpected error ocurred when fetching rule #{rule_id}: {error}");
        }
    })?;

    let choices = FormChoices::load(&connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve accounts and categories for edit rule page: {error}")
    })?;

    let history = get_transactions_for_rule(rule_id, HISTORY_LENGTH, &connection)
        .inspect_err(|error| {
            tracing::error!("Failed to retrieve transactions for rule #{rule_id}: {error}")
        })?;

    Ok(edit_rule_view(&rule, &choices, &history).into_response())
}

/// A route handler for updating a recurring rule.
pub async fn update_rule_endpoint(
    Path(rule_id): Path<RuleId>,
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

            return rule_form_view(
                FormTarget::Update(rule_id),
                &form,
                &choices,
                &error_message,
            )
            .into_response();
        }
    };

    match update_recurring_rule(rule_id, &draft, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(
            error @ (Error::UpdateMissingRule
            | Error::InvalidAccount(_)
            | Error::InvalidCategory(_)),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating rule {rule_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn edit_rule_view(
    rule: &RecurringRule,
    choices: &FormChoices,
    history: &[Transaction],
) -> Markup {
    let edit_endpoint = format_endpoint(endpoints::EDIT_RECURRING_VIEW, rule.id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let form = rule_form_view(
        FormTarget::Update(rule.id),
        &RuleForm::from(rule),
        choices,
        "",
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit " (rule.name) }

            (schedule_summary_view(rule))

            (form)

            (history_view(history))
        }
    };

    base("Edit Recurring Rule", &content)
}

fn schedule_summary_view(rule: &RecurringRule) -> Markup {
    let schedule = &rule.schedule;

    html! {
        dl class="w-full grid grid-cols-2 gap-2 mb-6 text-sm" data-schedule-summary
        {
            dt class="font-medium" { "Schedule" }
            dd { (schedule.describe()) }

            dt class="font-medium" { "Status" }
            dd
            {
                span class=(BADGE_STYLE) { (schedule.status.display_name()) }

                @if !schedule.enabled {
                    " "
                    span class=(BADGE_STYLE) { "Disabled" }
                }
            }

            dt class="font-medium" { "Next occurrence" }
            dd
            {
                @match schedule.next_execution_date {
                    Some(date) => { (date) }
                    None => { "None" }
                }
            }

            dt class="font-medium" { "Occurrences so far" }
            dd
            {
                (schedule.total_executions)

                @if let Some(remaining) = schedule.remaining_executions() {
                    " (" (remaining) " remaining)"
                }
            }
        }
    }
}

fn history_view(history: &[Transaction]) -> Markup {
    html! {
        section class="w-full mt-8"
        {
            h2 class="text-lg font-semibold mb-2" { "Recent transactions" }

            @if history.is_empty() {
                span class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "This rule has not created any transactions yet."
                }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for transaction in history {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(transaction.amount)) }
                            }
                        }
                    }
                }
            }
        }
    }
}


#[cfg(test)]
mod update_rule_endpoint_tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;

    use crate::{
        endpoints,
        recurring::{RuleForm, get_recurring_rule},
        test_utils::{
            assert_form_error_message, assert_hx_redirect, get_test_state, must_create_rule,
            must_get_form, parse_html_fragment, rent_form,
        },
    };

    use super::update_rule_endpoint;

    #[tokio::test]
    async fn can_update_rule() {
        let state = get_test_state();
        let rule = must_create_rule(rent_form(), &state.db_connection.lock().unwrap());
        let form = RuleForm {
            amount: -475.0,
            ..rent_form()
        };

        let response = update_rule_endpoint(Path(rule.id), State(state.clone()), Form(form))
            .await
            .into_response();

        assert_hx_redirect(&response, endpoints::RECURRING_VIEW);
        let got = get_recurring_rule(rule.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got.amount, -475.0);
    }

    #[tokio::test]
    async fn invalid_form_is_rendered_with_error() {
        let state = get_test_state();
        let rule = must_create_rule(rent_form(), &state.db_connection.lock().unwrap());
        let form = RuleForm {
            amount: 0.0,
            ..rent_form()
        };

        let response = update_rule_endpoint(Path(rule.id), State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Amount must be a non-zero number");
    }

    #[tokio::test]
    async fn update_missing_rule_returns_not_found() {
        let response = update_rule_endpoint(Path(1), State(get_test_state()), Form(rent_form()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
