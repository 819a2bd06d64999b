use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    Error, endpoints,
    recurrence::StatusAction,
    recurring::{
        lifecycle::change_rule_status,
        models::{RecurringState, RuleId},
    },
    timezone::local_today,
};

/// The form data for changing the status of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StatusForm {
    /// What to do with the rule.
    pub action: StatusAction,
}

/// A route handler for pausing, resuming or cancelling a recurring rule.
pub async fn update_rule_status_endpoint(
    Path(rule_id): Path<RuleId>,
    State(state): State<RecurringState>,
    Form(form): Form<StatusForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match change_rule_status(rule_id, form.action, today, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::InvalidStatusTransition { .. } | Error::NotFound)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while trying to {} rule {rule_id}: {error}",
                form.action
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;

    use crate::{
        endpoints,
        recurrence::{RuleStatus, StatusAction},
        recurring::get_recurring_rule,
        test_utils::{
            assert_alert_contains, assert_hx_redirect, get_test_state, must_create_rule,
            parse_html_fragment, rent_form,
        },
    };

    use super::{StatusForm, update_rule_status_endpoint};

    #[tokio::test]
    async fn can_pause_and_cancel_rule() {
        let state = get_test_state();
        let rule = must_create_rule(rent_form(), &state.db_connection.lock().unwrap());

        let response = update_rule_status_endpoint(
            Path(rule.id),
            State(state.clone()),
            Form(StatusForm {
                action: StatusAction::Pause,
            }),
        )
        .await;

        assert_hx_redirect(&response, endpoints::RECURRING_VIEW);
        let got = get_recurring_rule(rule.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got.schedule.status, RuleStatus::Paused);

        let response = update_rule_status_endpoint(
            Path(rule.id),
            State(state.clone()),
            Form(StatusForm {
                action: StatusAction::Cancel,
            }),
        )
        .await;

        assert_hx_redirect(&response, endpoints::RECURRING_VIEW);
        let got = get_recurring_rule(rule.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got.schedule.status, RuleStatus::Cancelled);
        assert_eq!(got.schedule.next_execution_date, None);
    }

    #[tokio::test]
    async fn invalid_transition_is_a_conflict() {
        let state = get_test_state();
        let rule = must_create_rule(rent_form(), &state.db_connection.lock().unwrap());

        let response = update_rule_status_endpoint(
            Path(rule.id),
            State(state),
            Form(StatusForm {
                action: StatusAction::Resume,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        assert_alert_contains(&html, "Could not resume rule");
    }

    #[tokio::test]
    async fn missing_rule_is_not_found() {
        let response = update_rule_status_endpoint(
            Path(1),
            State(get_test_state()),
            Form(StatusForm {
                action: StatusAction::Pause,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn parses_action_from_form() {
        let form: StatusForm = serde_html_form::from_str("action=resume").unwrap();

        assert_eq!(form.action, StatusAction::Resume);
    }
}
