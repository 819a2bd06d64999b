use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};

use crate::{
    Error,
    category::{Category, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_currency, loading_spinner,
    },
    navigation::NavBar,
    recurrence::{Frequency, RuleStatus},
    recurring::{
        db::get_recurring_rules,
        models::{RecurringRule, RecurringState, RuleFilter},
    },
};

/// Route handler for the recurring rules listing page.
pub async fn get_recurring_rules_page(
    State(state): State<RecurringState>,
    Query(filter): Query<RuleFilter>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rules = get_recurring_rules(&filter, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve recurring rules: {error}"))?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(rules_view(&rules, &categories, &filter).into_response())
}

fn rules_view(rules: &[RecurringRule], categories: &[Category], filter: &RuleFilter) -> Markup {
    let new_rule_route = endpoints::NEW_RECURRING_VIEW;
    let nav_bar = NavBar::new(endpoints::RECURRING_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                h1 class="text-xl font-bold" { "Recurring Rules" }

                section class="flex gap-4"
                {
                    button
                        hx-post=(endpoints::RUN_DUE_RULES)
                        hx-confirm="Create the transactions for every occurrence due today or earlier?"
                        hx-indicator="#loading-run-indicator"
                        hx-swap="none"
                        hx-target-error="#alert-container"
                        class="px-4 py-2 bg-blue-600 hover:bg-blue-700
                            active:enabled:bg-blue-800 disabled:opacity-50
                            text-white text-sm font-medium rounded transition-colors
                            flex items-center"
                    {
                        span id="loading-run-indicator" class="htmx-indicator" style="display: none;"
                        {
                            (spinner)
                        }

                        span class="button-text" { "Run Due Rules" }
                    }

                    button
                        hx-post=(endpoints::RUN_DUE_RULES)
                        hx-vals=r#"{"dry_run": "true"}"#
                        hx-swap="none"
                        hx-target-error="#alert-container"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "Dry Run"
                    }
                }

                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    (filter_form_view(filter, categories))

                    a href=(new_rule_route) class=(LINK_STYLE) { "Create Rule" }
                }

                section class="dark:bg-gray-800 overflow-x-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Schedule" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Next" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Occurrences" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for rule in rules {
                                (rule_row_view(rule, categories))
                            }

                            @if rules.is_empty() {
                                tr
                                {
                                    td
                                        colspan="8"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No recurring rules found. "
                                        a href=(new_rule_route) class=(LINK_STYLE)
                                        {
                                            "Create a rule"
                                        }
                                        " to add transactions on a schedule."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Recurring Rules", &content)
}

fn filter_form_view(filter: &RuleFilter, categories: &[Category]) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::RECURRING_VIEW)
            class="flex flex-wrap items-end gap-2"
            data-filter-form
        {
            select name="status" aria-label="Status" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Any status" }

                @for status in RuleStatus::ALL {
                    option value=(status.as_str()) selected[filter.status == Some(status)]
                    {
                        (status.display_name())
                    }
                }
            }

            select name="frequency" aria-label="Frequency" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Any frequency" }

                @for frequency in Frequency::ALL {
                    option value=(frequency.as_str()) selected[filter.frequency == Some(frequency)]
                    {
                        (frequency.display_name())
                    }
                }
            }

            @if !categories.is_empty() {
                select name="category_id" aria-label="Category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Any category" }

                    @for category in categories {
                        option value=(category.id) selected[filter.category_id == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }
        }
    }
}

fn rule_row_view(rule: &RecurringRule, categories: &[Category]) -> Markup {
    let schedule = &rule.schedule;
    let category_name = rule.category_id.and_then(|category_id| {
        categories
            .iter()
            .find(|category| category.id == category_id)
            .map(|category| category.name.as_str())
    });
    let edit_url = format_endpoint(endpoints::EDIT_RECURRING_VIEW, rule.id);
    let delete_url = format_endpoint(endpoints::RECURRING_RULE, rule.id);
    let status_url = format_endpoint(endpoints::RECURRING_STATUS, rule.id);

    html! {
        tr class=(TABLE_ROW_STYLE) data-rule-id=(rule.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                a href=(edit_url) class="font-medium text-gray-900 dark:text-white" { (rule.name) }
            }

            td class=(TABLE_CELL_STYLE) { (schedule.describe()) }

            td class=(TABLE_CELL_STYLE) { (format_currency(rule.amount)) }

            td class=(TABLE_CELL_STYLE) { (category_name.unwrap_or("-")) }

            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(next_execution_date) = schedule.next_execution_date {
                    (next_execution_date)
                } @else {
                    "-"
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                span class=(BADGE_STYLE) { (schedule.status.display_name()) }

                @if !schedule.enabled {
                    " "
                    span class=(BADGE_STYLE) { "Disabled" }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                (schedule.total_executions)

                @if let Some(max_executions) = schedule.max_executions {
                    " / " (max_executions)
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex flex-wrap gap-4"
                {
                    @for action in schedule.status.user_actions() {
                        button
                            type="button"
                            hx-post=(status_url)
                            hx-vals=(format!(r#"{{"action": "{}"}}"#, action.as_str()))
                            hx-target-error="#alert-container"
                            class=(LINK_STYLE)
                        {
                            (action.display_name())
                        }
                    }

                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &format!("Are you sure you want to delete the rule '{}'? Its transactions will be kept.", rule.name),
                        "closest tr",
                        "delete",
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Query;
    use scraper::{Html, Selector};

    use crate::{
        category::{CategoryKind, CategoryName, create_category},
        endpoints::{self, format_endpoint},
        recurrence::{Frequency, RuleStatus, StatusAction},
        recurring::{RuleFilter, RuleForm, change_rule_status},
        test_utils::{
            assert_valid_html, extract_query, get_test_state, must_create_rule,
            parse_html_document, rent_form,
        },
    };

    use super::get_recurring_rules_page;

    fn rule_names(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("tbody tr[data-rule-id] td:first-child a").unwrap())
            .map(|link| link.text().collect())
            .collect()
    }

    #[tokio::test]
    async fn lists_rules_with_actions() {
        let state = get_test_state();
        let rule = must_create_rule(rent_form(), &state.db_connection.lock().unwrap());

        let response = get_recurring_rules_page(State(state), Query(RuleFilter::default()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(rule_names(&html), vec!["Rent"]);

        let row = html
            .select(&Selector::parse("tr[data-rule-id]").unwrap())
            .next()
            .unwrap();
        let text = row.text().collect::<String>();
        assert!(text.contains("Monthly on day 1"), "got {text}");
        assert!(text.contains("-$450.00"), "got {text}");
        assert!(text.contains("2025-01-01"), "got {text}");

        let status_url = format_endpoint(endpoints::RECURRING_STATUS, rule.id);
        let actions: Vec<_> = row
            .select(&Selector::parse("button[hx-vals]").unwrap())
            .filter(|button| button.value().attr("hx-post") == Some(status_url.as_str()))
            .map(|button| button.text().collect::<String>())
            .collect();
        assert_eq!(actions, vec!["Pause", "Cancel"]);

        let delete_url = format_endpoint(endpoints::RECURRING_RULE, rule.id);
        assert!(
            row.select(&Selector::parse("button[hx-delete]").unwrap())
                .any(|button| button.value().attr("hx-delete") == Some(delete_url.as_str()))
        );
    }

    #[tokio::test]
    async fn filters_by_status_and_frequency() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let rent = must_create_rule(rent_form(), &connection);
            must_create_rule(
                RuleForm {
                    name: "Gym".to_owned(),
                    frequency: Frequency::Weekly,
                    ..rent_form()
                },
                &connection,
            );
            change_rule_status(
                rent.id,
                StatusAction::Pause,
                time::macros::date!(2025 - 01 - 01),
                &connection,
            )
            .unwrap();
        }

        let paused = get_recurring_rules_page(
            State(state.clone()),
            Query(RuleFilter {
                status: Some(RuleStatus::Paused),
                ..Default::default()
            }),
        )
        .await
        .into_response();
        let weekly = get_recurring_rules_page(
            State(state),
            Query(RuleFilter {
                frequency: Some(Frequency::Weekly),
                ..Default::default()
            }),
        )
        .await
        .into_response();

        assert_eq!(rule_names(&parse_html_document(paused).await), vec!["Rent"]);
        assert_eq!(rule_names(&parse_html_document(weekly).await), vec!["Gym"]);
    }

    #[tokio::test]
    async fn filters_by_category_and_shows_its_name() {
        let state = get_test_state();
        let housing = {
            let connection = state.db_connection.lock().unwrap();
            let housing = create_category(
                &CategoryName::new("Housing").unwrap(),
                CategoryKind::Expense,
                &connection,
            )
            .unwrap();
            must_create_rule(
                RuleForm {
                    category_id: Some(housing.id),
                    ..rent_form()
                },
                &connection,
            );
            must_create_rule(
                RuleForm {
                    name: "Gym".to_owned(),
                    ..rent_form()
                },
                &connection,
            );
            housing
        };

        let response = get_recurring_rules_page(
            State(state),
            Query(RuleFilter {
                category_id: Some(housing.id),
                ..Default::default()
            }),
        )
        .await
        .into_response();

        let html = parse_html_document(response).await;
        assert_eq!(rule_names(&html), vec!["Rent"]);
        let row_text = html
            .select(&Selector::parse("tr[data-rule-id]").unwrap())
            .map(|row| row.text().collect::<String>())
            .collect::<String>();
        assert!(row_text.contains("Housing"), "got {row_text}");
        let selected_category = html
            .select(&Selector::parse("select[name=category_id] option[selected]").unwrap())
            .next()
            .and_then(|option| option.value().attr("value"))
            .map(str::to_owned);
        assert_eq!(selected_category, Some(housing.id.to_string()));
    }

    #[tokio::test]
    async fn shows_empty_state() {
        let response = get_recurring_rules_page(State(get_test_state()), Query(RuleFilter::default()))
            .await
            .into_response();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("No recurring rules found."), "got {text}");
    }

    #[tokio::test]
    async fn empty_filter_fields_match_everything() {
        let filter: RuleFilter =
            extract_query("status=&frequency=monthly&category_id=&account_id=").await;

        assert_eq!(
            filter,
            RuleFilter {
                frequency: Some(Frequency::Monthly),
                ..Default::default()
            }
        );
    }
}
