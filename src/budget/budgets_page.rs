//! The page comparing a month's budgets with what was spent and what
//! recurring rules will still spend.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    budget::core::{BudgetMonth, BudgetProgress, BudgetStatus, get_budget_progress},
    category::CategoryId,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, delete_button, format_currency,
    },
    navigation::NavBar,
    recurrence::{RuleStatus, upcoming_occurrences},
    recurring::{RecurringRule, RuleFilter, get_recurring_rules},
    timezone::local_today,
};

/// More occurrences than any rule can have in one month.
const MAX_OCCURRENCES_PER_MONTH: usize = 31;

/// The state needed for the budget pages and endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, used to find the current month.
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The month to show. Missing or invalid values select the current month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct BudgetQuery {
    pub year: Option<i32>,
    /// The month number, 1 for January.
    pub month: Option<u8>,
}

impl BudgetQuery {
    pub(super) fn selected_month(self, today: Date) -> BudgetMonth {
        match (self.year, self.month) {
            (Some(year), Some(month)) => {
                BudgetMonth::new(year, month).unwrap_or_else(|_| BudgetMonth::containing(today))
            }
            _ => BudgetMonth::containing(today),
        }
    }
}

/// The URL of the budgets page for `month`.
pub(super) fn month_url(month: BudgetMonth) -> String {
    format!(
        "{}?year={}&month={}",
        endpoints::BUDGETS_VIEW,
        month.year(),
        month.month_number()
    )
}

/// A budget with the spending its category's rules still have to book.
#[derive(Debug, PartialEq)]
struct BudgetTableRow {
    progress: BudgetProgress,
    scheduled: f64,
}

/// Route handler for the budgets page.
pub async fn get_budgets_page(
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

    let progress = get_budget_progress(month, &connection).inspect_err(|error| {
        tracing::error!("could not get budgets for {}: {error}", month.label())
    })?;

    let rules = get_recurring_rules(
        &RuleFilter {
            status: Some(RuleStatus::Active),
            enabled: Some(true),
            ..Default::default()
        },
        &connection,
    )
    .inspect_err(|error| tracing::error!("could not get rules for budgets page: {error}"))?;

    let rows: Vec<BudgetTableRow> = progress
        .into_iter()
        .map(|progress| {
            let scheduled = scheduled_spending(&rules, progress.budget.category_id, month);

            BudgetTableRow {
                progress,
                scheduled,
            }
        })
        .collect();

    Ok(budgets_view(&rows, month).into_response())
}

/// The spending that rules in `category_id` will book in `month` but have
/// not booked yet, overdue occurrences included.
fn scheduled_spending(rules: &[RecurringRule], category_id: CategoryId, month: BudgetMonth) -> f64 {
    rules
        .iter()
        .filter(|rule| rule.category_id == Some(category_id))
        .flat_map(|rule| {
            upcoming_occurrences(
                &rule.schedule,
                month.first_day(),
                month.last_day(),
                MAX_OCCURRENCES_PER_MONTH,
            )
            .into_iter()
            .map(move |_| -rule.amount)
        })
        .sum()
}

fn status_style(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::OnTrack => "h-2 rounded bg-green-500",
        BudgetStatus::NearLimit => "h-2 rounded bg-amber-500",
        BudgetStatus::Exceeded => "h-2 rounded bg-red-600",
    }
}

fn budgets_view(rows: &[BudgetTableRow], month: BudgetMonth) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();
    let new_budget_url = format!(
        "{}?year={}&month={}",
        endpoints::NEW_BUDGET_VIEW,
        month.year(),
        month.month_number()
    );
    let total_budgeted: f64 = rows.iter().map(|row| row.progress.budget.amount).sum();
    let total_spent: f64 = rows.iter().map(|row| row.progress.spent).sum();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Budgets for " (month.label()) }

                    a href=(new_budget_url) class=(LINK_STYLE) { "Add Budget" }
                }

                nav class="flex items-center gap-4 text-sm" aria-label="Month"
                {
                    @if let Some(previous) = month.previous() {
                        a href=(month_url(previous)) class=(BUTTON_SECONDARY_STYLE) rel="prev"
                        {
                            (previous.label())
                        }
                    }

                    @if let Some(next) = month.next() {
                        a href=(month_url(next)) class=(BUTTON_SECONDARY_STYLE) rel="next"
                        {
                            (next.label())
                        }
                    }
                }

                dl class="flex gap-6 text-sm" data-budget-totals
                {
                    div
                    {
                        dt class="font-medium" { "Budgeted" }
                        dd { (format_currency(total_budgeted)) }
                    }
                    div
                    {
                        dt class="font-medium" { "Spent" }
                        dd { (format_currency(total_spent)) }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Budget" }
                                th scope="col" class="px-6 py-3 text-right" { "Spent" }
                                th scope="col" class="px-6 py-3 text-right" { "Scheduled" }
                                th scope="col" class="px-6 py-3 text-right" { "Remaining" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Progress" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (budget_row_view(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="7"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No budgets for " (month.label()) ". Create a budget "
                                        a href=(new_budget_url) class=(LINK_STYLE) { "here" }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Budgets", &content)
}

fn budget_row_view(row: &BudgetTableRow) -> Markup {
    let progress = &row.progress;
    let status = progress.status();
    let percent_used = progress.percent_used();
    let bar_width = format!("width: {:.0}%", percent_used.clamp(0.0, 100.0));

    html! {
        tr class=(TABLE_ROW_STYLE) data-budget
        {
            th
                scope="row"
                class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
            {
                (progress.category_name)
            }
            td class="px-6 py-4 text-right" { (format_currency(progress.budget.amount)) }
            td class="px-6 py-4 text-right" { (format_currency(progress.spent)) }
            td class="px-6 py-4 text-right" { (format_currency(row.scheduled)) }
            td class="px-6 py-4 text-right" { (format_currency(progress.remaining())) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex items-center gap-2"
                {
                    div class="w-24 h-2 rounded bg-gray-200 dark:bg-gray-700"
                    {
                        div class=(status_style(status)) style=(bar_width) {}
                    }

                    span { (format!("{percent_used:.0}%")) }

                    span class=(BADGE_STYLE) data-budget-status { (status.display_name()) }
                }

                @if status != BudgetStatus::Exceeded
                    && progress.spent + row.scheduled > progress.budget.amount
                {
                    span class="block text-xs text-amber-600 dark:text-amber-400"
                    {
                        "Scheduled rules will exceed this budget"
                    }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                (delete_button(
                    &format_endpoint(endpoints::BUDGET, progress.budget.id),
                    &format!(
                        "Are you sure you want to delete the {} budget?",
                        progress.category_name
                    ),
                    "closest tr",
                    "delete",
                ))
            }
        }
    }
}

#[cfg(test)]
mod budget_query_tests {
    use time::macros::date;

    use crate::{budget::core::BudgetMonth, test_utils::extract_query};

    use super::{BudgetQuery, month_url};

    #[test]
    fn falls_back_to_current_month() {
        let today = date!(2025 - 06 - 15);
        let june = BudgetMonth::new(2025, 6).unwrap();

        assert_eq!(BudgetQuery::default().selected_month(today), june);
        assert_eq!(
            BudgetQuery {
                year: Some(2025),
                month: Some(13),
            }
            .selected_month(today),
            june
        );
        assert_eq!(
            BudgetQuery {
                year: Some(2024),
                month: Some(2),
            }
            .selected_month(today),
            BudgetMonth::new(2024, 2).unwrap()
        );
    }

    #[tokio::test]
    async fn empty_fields_select_current_month() {
        let query: BudgetQuery = extract_query("year=&month=").await;

        assert_eq!(query, BudgetQuery::default());
    }

    #[test]
    fn month_url_has_year_and_month() {
        assert_eq!(
            month_url(BudgetMonth::new(2024, 12).unwrap()),
            "/budgets?year=2024&month=12"
        );
    }
}
