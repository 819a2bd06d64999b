//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered into the `#alert-container` element of the base page,
//! either as the target of a failed htmx request (`hx-target-error`) or as an
//! out-of-band swap alongside a successful response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// A dismissable message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with a second line of details.
    Success {
        /// The headline.
        message: String,
        /// Supporting text shown below the headline.
        details: String,
    },
    /// A success message on its own.
    SuccessSimple {
        /// The headline.
        message: String,
    },
    /// An error message with a second line of details.
    Error {
        /// The headline.
        message: String,
        /// Supporting text, usually how to fix the problem.
        details: String,
    },
    /// An error message on its own.
    ErrorSimple {
        /// The headline.
        message: String,
    },
}

const SUCCESS_STYLE: &str = "flex items-start gap-3 p-4 mb-4 rounded shadow-lg \
    text-green-800 bg-green-50 border border-green-300 \
    dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start gap-3 p-4 mb-4 rounded shadow-lg \
    text-red-800 bg-red-50 border border-red-300 \
    dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

impl Alert {
    /// Render the alert as a fragment that replaces the alert container.
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, message, Some(details)),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, None),
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
            Alert::ErrorSimple { message } => (ERROR_STYLE, message, None),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div role="alert" class=(style)
                {
                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if let Some(details) = details.filter(|details| !details.is_empty()) {
                            p class="mt-1 text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="text-sm font-bold opacity-70 hover:opacity-100"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        (StatusCode::OK, self.into_html()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use scraper::Selector;

    use crate::test_utils::{assert_valid_html, parse_html_fragment};

    use super::Alert;

    #[tokio::test]
    async fn renders_message_and_details() {
        let response = Alert::Error {
            message: "Could not save".to_owned(),
            details: "Try again".to_owned(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let paragraphs: Vec<String> = html
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect())
            .collect();
        assert_eq!(paragraphs, vec!["Could not save", "Try again"]);
    }

    #[tokio::test]
    async fn simple_alert_has_no_details() {
        let response = Alert::SuccessSimple {
            message: "Saved".to_owned(),
        }
        .into_response();

        let html = parse_html_fragment(response).await;
        let paragraph_count = html.select(&Selector::parse("p").unwrap()).count();
        assert_eq!(paragraph_count, 1);
        assert!(
            html.select(&Selector::parse("#alert-container").unwrap())
                .next()
                .is_some()
        );
    }
}
