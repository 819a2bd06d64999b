//! Defines the route handler for the page that lists transactions, newest first.

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
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    recurring::RuleId,
    transaction::core::count_transactions,
};

/// The page size used when the request does not give one.
const DEFAULT_PAGE_SIZE: u64 = 20;
/// The largest page size a request may ask for.
const MAX_PAGE_SIZE: u64 = 100;

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the transactions page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionsQuery {
    /// The 1-based page number. Out of range pages show the nearest page.
    pub page: Option<u64>,
    /// Transactions per page, clamped to 1 to 100.
    pub per_page: Option<u64>,
}

/// The page of transactions to show, after clamping the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageWindow {
    page: u64,
    per_page: u64,
    page_count: u64,
}

impl PageWindow {
    fn new(query: TransactionsQuery, transaction_count: u64) -> Self {
        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page_count = transaction_count.div_ceil(per_page).max(1);
        let page = query.page.unwrap_or(1).clamp(1, page_count);

        Self {
            page,
            per_page,
            page_count,
        }
    }

    fn offset(self) -> u64 {
        (self.page - 1) * self.per_page
    }

    fn url(self, page: u64) -> String {
        format!(
            "{}?page={page}&per_page={}",
            endpoints::TRANSACTIONS_VIEW,
            self.per_page
        )
    }
}

/// A transaction with the names of what it refers to.
#[derive(Debug, PartialEq)]
struct TransactionTableRow {
    date: Date,
    description: String,
    amount: f64,
    account_name: Option<String>,
    category_name: Option<String>,
    rule: Option<(RuleId, String)>,
}

/// Route handler for the transactions page.
pub async fn get_transactions_page(
    State(state): State<TransactionState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction_count = count_transactions(&connection)
        .inspect_err(|error| tracing::error!("could not count transactions: {error}"))?;
    let window = PageWindow::new(query, transaction_count);

    let transactions = get_transaction_rows(window, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    Ok(transactions_view(&transactions, window, transaction_count).into_response())
}

fn get_transaction_rows(
    window: PageWindow,
    connection: &Connection,
) -> Result<Vec<TransactionTableRow>, Error> {
    connection
        .prepare(
            "SELECT t.date, t.description, t.amount, a.name, c.name, r.id, r.name
             FROM \"transaction\" t
             LEFT JOIN account a ON a.id = t.account_id
             LEFT JOIN category c ON c.id = t.category_id
             LEFT JOIN recurring_rule r ON r.id = t.recurring_rule_id
             ORDER BY t.date DESC, t.id DESC
             LIMIT ?1 OFFSET ?2",
        )?
        .query_map((window.per_page, window.offset()), |row| {
            let rule_id: Option<RuleId> = row.get(5)?;
            let rule_name: Option<String> = row.get(6)?;

            Ok(TransactionTableRow {
                date: row.get(0)?,
                description: row.get(1)?,
                amount: row.get(2)?,
                account_name: row.get(3)?,
                category_name: row.get(4)?,
                rule: rule_id.zip(rule_name),
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

fn transactions_view(
    transactions: &[TransactionTableRow],
    window: PageWindow,
    transaction_count: u64,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    span class="text-sm" { (transaction_count) " in total" }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Rule" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                tr class=(TABLE_ROW_STYLE) data-transaction
                                {
                                    td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                    td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                    td class="px-6 py-4 text-right" { (format_currency(transaction.amount)) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (transaction.account_name.as_deref().unwrap_or("-"))
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        @if let Some(category_name) = &transaction.category_name {
                                            span class=(BADGE_STYLE) { (category_name) }
                                        } @else {
                                            "-"
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        @if let Some((rule_id, rule_name)) = &transaction.rule {
                                            a
                                                href=(format_endpoint(endpoints::EDIT_RECURRING_VIEW, *rule_id))
                                                class=(LINK_STYLE)
                                            {
                                                (rule_name)
                                            }
                                        } @else {
                                            "-"
                                        }
                                    }
                                }
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions yet. Recurring rules add transactions when you "
                                        a href=(endpoints::RECURRING_VIEW) class=(LINK_STYLE) { "run the due rules" }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination_view(window))
            }
        }
    );

    base("Transactions", &content)
}

fn pagination_view(window: PageWindow) -> Markup {
    html! {
        nav class="flex items-center justify-center gap-4 text-sm" aria-label="Pagination"
        {
            @if window.page > 1 {
                a href=(window.url(window.page - 1)) class=(BUTTON_SECONDARY_STYLE) rel="prev"
                {
                    "Previous"
                }
            }

            span aria-current="page" { "Page " (window.page) " of " (window.page_count) }

            @if window.page < window.page_count {
                a href=(window.url(window.page + 1)) class=(BUTTON_SECONDARY_STYLE) rel="next"
                {
                    "Next"
                }
            }
        }
    }
}


#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Query;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        account::create_account,
        category::{CategoryKind, CategoryName, create_category},
        recurring::{RuleForm, RunOptions, run_due_rules},
        test_utils::{
            assert_valid_html, get_test_connection, must_create_rule, parse_html_document,
            rent_form,
        },
        transaction::core::{Transaction, create_transaction},
    };

    use super::{TransactionState, TransactionsQuery, get_transactions_page};

    fn rows(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("tr[data-transaction]").unwrap())
            .map(|row| row.text().collect::<String>())
            .collect()
    }

    #[tokio::test]
    async fn lists_rule_transactions_with_their_labels() {
        let connection = get_test_connection();
        let account = create_account("Everyday", &connection).unwrap();
        let housing = create_category(
            &CategoryName::new("Housing").unwrap(),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();
        must_create_rule(
            RuleForm {
                account_id: Some(account.id),
                category_id: Some(housing.id),
                ..rent_form()
            },
            &connection,
        );
        run_due_rules(&connection, date!(2025 - 02 - 15), &RunOptions::default()).unwrap();
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_transactions_page(State(state), Query(TransactionsQuery::default()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let rows = rows(&html);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("2025-02-01"), "got {rows:?}");
        for row in &rows {
            assert!(row.contains("Rent payment"), "got {row}");
            assert!(row.contains("-$450.00"), "got {row}");
            assert!(row.contains("Everyday"), "got {row}");
            assert!(row.contains("Housing"), "got {row}");
            assert!(row.contains("Rent"), "got {row}");
        }
    }

    #[tokio::test]
    async fn pages_through_transactions() {
        let connection = get_test_connection();
        for day in 1..=5 {
            create_transaction(
                Transaction::build(
                    -4.5,
                    date!(2025 - 03 - 01).replace_day(day).unwrap(),
                    &format!("Coffee {day}"),
                ),
                &connection,
            )
            .unwrap();
        }
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_transactions_page(
            State(state),
            Query(TransactionsQuery {
                page: Some(2),
                per_page: Some(2),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let rows = rows(&html);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("Coffee 3"), "got {rows:?}");
        assert!(rows[1].contains("Coffee 2"), "got {rows:?}");

        let links: Vec<_> = html
            .select(&Selector::parse("nav[aria-label=Pagination] a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert_eq!(
            links,
            vec![
                "/transactions?page=1&per_page=2",
                "/transactions?page=3&per_page=2"
            ]
        );
    }

    #[tokio::test]
    async fn empty_page_points_to_due_rules() {
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = get_transactions_page(State(state), Query(TransactionsQuery::default()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("No transactions yet."), "got {text}");
        assert!(text.contains("Page 1 of 1"), "got {text}");
    }
}
