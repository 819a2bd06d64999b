use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    category::{
        core::{CategoryId, CategoryKind},
        create::CategoryState,
    },
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, delete_button,
    },
    navigation::NavBar,
};

/// A category with how much refers to it.
#[derive(Debug, PartialEq)]
struct CategoryTableRow {
    id: CategoryId,
    name: String,
    kind: CategoryKind,
    rule_count: i64,
    transaction_count: i64,
}

/// Route handler for the categories listing page.
pub async fn get_categories_page(State(state): State<CategoryState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_category_rows(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    Ok(categories_view(&categories).into_response())
}

fn get_category_rows(connection: &Connection) -> Result<Vec<CategoryTableRow>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.name, c.kind,
                (SELECT COUNT(*) FROM recurring_rule r WHERE r.category_id = c.id),
                (SELECT COUNT(*) FROM \"transaction\" t WHERE t.category_id = c.id)
             FROM category c
             ORDER BY c.kind = 'income', c.name COLLATE NOCASE",
        )?
        .query_map([], |row| {
            Ok(CategoryTableRow {
                id: row.get(0)?,
                name: row.get(1)?,
                kind: row.get(2)?,
                rule_count: row.get(3)?,
                transaction_count: row.get(4)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

fn categories_view(categories: &[CategoryTableRow]) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(new_category_route) class=(LINK_STYLE) { "Add Category" }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Rules" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for category in categories {
                                tr class=(TABLE_ROW_STYLE) data-category
                                {
                                    th
                                        scope="row"
                                        class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                                    {
                                        (category.name)
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        span class=(BADGE_STYLE) { (category.kind.display_name()) }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (category.rule_count) }
                                    td class=(TABLE_CELL_STYLE) { (category.transaction_count) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (delete_button(
                                            &format_endpoint(endpoints::CATEGORY, category.id),
                                            &format!(
                                                "Are you sure you want to delete the category '{}'? \
                                                Its rules and transactions will be kept and its budgets deleted.",
                                                category.name
                                            ),
                                            "closest tr",
                                            "delete",
                                        ))
                                    }
                                }
                            }

                            @if categories.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories found. Create a category "
                                        a href=(new_category_route) class=(LINK_STYLE) { "here" }
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

    base("Categories", &content)
}
