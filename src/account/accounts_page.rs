//! Displays accounts and the balance of the transactions booked to them.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
};

/// The state needed for the account pages and endpoints.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The account data to display in the view
#[derive(Debug, PartialEq)]
struct AccountTableRow {
    name: String,
    balance: f64,
    transaction_count: i64,
    rule_count: i64,
}

/// Renders the accounts page showing all accounts.
pub async fn get_accounts_page(State(state): State<AccountState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_account_rows(&connection)
        .inspect_err(|error| tracing::error!("could not get all accounts: {error}"))?;

    Ok(accounts_view(&accounts).into_response())
}

fn get_account_rows(connection: &Connection) -> Result<Vec<AccountTableRow>, Error> {
    connection
        .prepare(
            "SELECT a.name,
                (SELECT COALESCE(SUM(t.amount), 0.0) FROM \"transaction\" t WHERE t.account_id = a.id),
                (SELECT COUNT(*) FROM \"transaction\" t WHERE t.account_id = a.id),
                (SELECT COUNT(*) FROM recurring_rule r WHERE r.account_id = a.id)
             FROM account a
             ORDER BY a.name ASC",
        )?
        .query_map([], |row| {
            Ok(AccountTableRow {
                name: row.get(0)?,
                balance: row.get(1)?,
                transaction_count: row.get(2)?,
                rule_count: row.get(3)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

fn accounts_view(accounts: &[AccountTableRow]) -> Markup {
    let create_account_page_url = endpoints::NEW_ACCOUNT_VIEW;
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Accounts" }

                    a href=(create_account_page_url) class=(LINK_STYLE)
                    {
                        "Add Account"
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Rules" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                tr class=(TABLE_ROW_STYLE) data-account
                                {
                                    th
                                        scope="row"
                                        class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                                    {
                                        (account.name)
                                    }

                                    td class="px-6 py-4 text-right" { (format_currency(account.balance)) }

                                    td class=(TABLE_CELL_STYLE) { (account.transaction_count) }

                                    td class=(TABLE_CELL_STYLE) { (account.rule_count) }
                                }
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts found. Create an account "
                                        a href=(create_account_page_url) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
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

    base("Accounts", &content)
}
