use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, Duration};

use crate::{
    Error,
    app_state::RecurringConfig,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    recurrence::{RuleStatus, upcoming_occurrences},
    recurring::{
        db::get_recurring_rules,
        models::{RecurringRule, RecurringState, RuleFilter},
    },
    timezone::local_today,
};

/// The most occurrences of one rule listed within the window.
const MAX_OCCURRENCES_PER_RULE: usize = 400;
/// The most overdue occurrences of one rule listed, earliest first.
const MAX_OVERDUE_PER_RULE: usize = 31;

/// The query parameters for the upcoming page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct UpcomingQuery {
    /// How many days ahead to look, clamped to 1 to 90.
    pub days: Option<u32>,
}

/// A projected occurrence of a rule.
#[derive(Debug, Clone, PartialEq)]
struct UpcomingOccurrence<'a> {
    date: Date,
    rule: &'a RecurringRule,
}

/// Route handler for the page listing the occurrences of active rules over
/// the coming days, including those that are already overdue.
pub async fn get_upcoming_page(
    State(state): State<RecurringState>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let days = window_days(query.days, &state.recurring_config);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rules = get_recurring_rules(
        &RuleFilter {
            status: Some(RuleStatus::Active),
            enabled: Some(true),
            ..Default::default()
        },
        &connection,
    )
    .inspect_err(|error| tracing::error!("Failed to retrieve rules for upcoming page: {error}"))?;

    let until = today.saturating_add(Duration::days(i64::from(days)));
    let occurrences = collect_occurrences(&rules, today, until);

    Ok(upcoming_view(&occurrences, today, days).into_response())
}

fn window_days(requested: Option<u32>, config: &RecurringConfig) -> u32 {
    requested
        .unwrap_or(config.upcoming_days)
        .clamp(1, RecurringConfig::MAX_UPCOMING_DAYS)
}

/// The pending occurrences from `today` up to and including `until`, plus the
/// earliest overdue occurrences of each rule, earliest first.
///
/// Overdue and window occurrences are projected separately so that a rule
/// far behind schedule still shows what falls due in the window. Projection
/// gives up after 4000 occurrences, so a rule further behind than that only
/// shows its overdue occurrences.
fn collect_occurrences(
    rules: &[RecurringRule],
    today: Date,
    until: Date,
) -> Vec<UpcomingOccurrence<'_>> {
    let mut occurrences: Vec<UpcomingOccurrence> = rules
        .iter()
        .flat_map(|rule| {
            let overdue = match today.previous_day() {
                Some(yesterday) => upcoming_occurrences(
                    &rule.schedule,
                    Date::MIN,
                    yesterday,
                    MAX_OVERDUE_PER_RULE,
                ),
                None => Vec::new(),
            };
            let window =
                upcoming_occurrences(&rule.schedule, today, until, MAX_OCCURRENCES_PER_RULE);

            overdue
                .into_iter()
                .chain(window)
                .map(move |date| UpcomingOccurrence { date, rule })
        })
        .collect();

    occurrences.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.rule.name.cmp(&b.rule.name)));

    occurrences
}

fn upcoming_view(occurrences: &[UpcomingOccurrence], today: Date, days: u32) -> Markup {
    let nav_bar = NavBar::new(endpoints::UPCOMING_VIEW).into_html();

    let income: f64 = occurrences
        .iter()
        .map(|occurrence| occurrence.rule.amount)
        .filter(|amount| *amount > 0.0)
        .sum();
    let expenses: f64 = occurrences
        .iter()
        .map(|occurrence| occurrence.rule.amount)
        .filter(|amount| *amount < 0.0)
        .sum();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                h1 class="text-xl font-bold" { "Upcoming" }

                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    form method="get" action=(endpoints::UPCOMING_VIEW) class="flex items-end gap-2"
                    {
                        label for="days" class="text-sm" { "Days ahead" }

                        input
                            id="days"
                            type="number"
                            name="days"
                            min="1"
                            max=(RecurringConfig::MAX_UPCOMING_DAYS)
                            value=(days)
                            class=(FORM_TEXT_INPUT_STYLE);

                        button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Show" }
                    }

                    dl class="flex gap-6 text-sm" data-upcoming-totals
                    {
                        div
                        {
                            dt class="font-medium" { "Income" }
                            dd { (format_currency(income)) }
                        }
                        div
                        {
                            dt class="font-medium" { "Expenses" }
                            dd { (format_currency(expenses)) }
                        }
                    }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Rule" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for occurrence in occurrences {
                                tr class=(TABLE_ROW_STYLE) data-occurrence
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (occurrence.date)

                                        @if occurrence.date < today {
                                            " "
                                            span class=(BADGE_STYLE) { "Overdue" }
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a
                                            href=(format_endpoint(endpoints::EDIT_RECURRING_VIEW, occurrence.rule.id))
                                            class=(LINK_STYLE)
                                        {
                                            (occurrence.rule.name)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (occurrence.rule.description_template) }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(occurrence.rule.amount)) }
                                }
                            }

                            @if occurrences.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "Nothing is due in the next " (days) " days."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Upcoming", &content)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        app_state::RecurringConfig,
        recurrence::Frequency,
        recurring::RuleForm,
        test_utils::{get_test_connection, must_create_rule, rent_form},
    };

    use super::{collect_occurrences, window_days};

    #[test]
    fn window_is_clamped() {
        let config = RecurringConfig::default();

        assert_eq!(window_days(None, &config), 30);
        assert_eq!(window_days(Some(0), &config), 1);
        assert_eq!(window_days(Some(7), &config), 7);
        assert_eq!(window_days(Some(365), &config), 90);
    }

    #[test]
    fn merges_rules_in_date_order() {
        let connection = get_test_connection();
        let rent = must_create_rule(rent_form(), &connection);
        let gym = must_create_rule(
            RuleForm {
                name: "Gym".to_owned(),
                frequency: Frequency::Weekly,
                start_date: date!(2025 - 01 - 10),
                ..rent_form()
            },
            &connection,
        );
        let rules = vec![rent.clone(), gym.clone()];

        let occurrences =
            collect_occurrences(&rules, date!(2025 - 01 - 15), date!(2025 - 02 - 01));

        let got: Vec<_> = occurrences
            .iter()
            .map(|occurrence| (occurrence.date, occurrence.rule.id))
            .collect();
        assert_eq!(
            got,
            vec![
                (date!(2025 - 01 - 01), rent.id),
                (date!(2025 - 01 - 10), gym.id),
                (date!(2025 - 01 - 17), gym.id),
                (date!(2025 - 01 - 24), gym.id),
                (date!(2025 - 01 - 31), gym.id),
                (date!(2025 - 02 - 01), rent.id),
            ]
        );
    }

    #[test]
    fn long_overdue_rule_still_lists_window() {
        let connection = get_test_connection();
        let daily = must_create_rule(
            RuleForm {
                name: "Coffee".to_owned(),
                frequency: Frequency::Daily,
                ..rent_form()
            },
            &connection,
        );
        let rules = vec![daily];

        let occurrences =
            collect_occurrences(&rules, date!(2026 - 06 - 01), date!(2026 - 06 - 03));

        let dates: Vec<_> = occurrences
            .iter()
            .map(|occurrence| occurrence.date)
            .collect();
        assert_eq!(dates.len(), 31 + 3);
        assert_eq!(dates[0], date!(2025 - 01 - 01));
        assert_eq!(dates[30], date!(2025 - 01 - 31));
        assert_eq!(
            dates[31..],
            [
                date!(2026 - 06 - 01),
                date!(2026 - 06 - 02),
                date!(2026 - 06 - 03)
            ]
        );
    }
}

#[cfg(test)]
mod upcoming_page_tests {
    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Query;
    use scraper::Selector;

    use crate::{
        recurring::RuleForm,
        test_utils::{
            assert_valid_html, get_test_state, must_create_rule, parse_html_document, rent_form,
        },
    };

    use super::{UpcomingQuery, get_upcoming_page};

    #[tokio::test]
    async fn lists_overdue_occurrences() {
        let state = get_test_state();
        must_create_rule(
            RuleForm {
                max_executions: Some(2),
                ..rent_form()
            },
            &state.db_connection.lock().unwrap(),
        );

        let response = get_upcoming_page(State(state), Query(UpcomingQuery { days: Some(7) }))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows: Vec<String> = html
            .select(&Selector::parse("tr[data-occurrence]").unwrap())
            .map(|row| row.text().collect())
            .collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("2025-01-01"), "got {rows:?}");
        assert!(rows[0].contains("Overdue"), "got {rows:?}");
        assert!(rows[1].contains("2025-02-01"), "got {rows:?}");
    }

    #[tokio::test]
    async fn shows_empty_state() {
        let response = get_upcoming_page(State(get_test_state()), Query(UpcomingQuery::default()))
            .await
            .into_response();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Nothing is due in the next 30 days."), "got {text}");
    }
}
