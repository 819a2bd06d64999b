//! The category model and its database queries.

use std::{fmt, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, account::AccountId, database_id::DatabaseId, recurrence::UnknownVariant};

/// The database id of a [Category].
pub type CategoryId = DatabaseId;

/// The longest allowed category name, in characters.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// Whether a category is for money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Spending, e.g. groceries or rent.
    Expense,
    /// Earnings, e.g. wages or interest.
    Income,
}

impl CategoryKind {
    /// All kinds in display order.
    pub const ALL: [CategoryKind; 2] = [CategoryKind::Expense, CategoryKind::Income];

    /// The identifier used for storage and form values.
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }

    /// The name shown on pages.
    pub fn display_name(self) -> &'static str {
        match self {
            CategoryKind::Expense => "Expense",
            CategoryKind::Income => "Income",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for CategoryKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_owned(), "category kind"))
    }
}

impl ToSql for CategoryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The name of a category, trimmed and between 1 and
/// [MAX_CATEGORY_NAME_LENGTH] characters long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    /// Returns [Error::EmptyCategoryName] if `name` is blank or
    /// [Error::CategoryNameTooLong] if it has too many characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyCategoryName);
        }

        if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
            return Err(Error::CategoryNameTooLong(MAX_CATEGORY_NAME_LENGTH));
        }

        Ok(Self(name.to_owned()))
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A label for transactions and recurring rules, e.g. "Groceries" or "Wages".
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    /// The unique display name.
    pub name: String,
    pub kind: CategoryKind,
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Create a category named `name`.
///
/// # Errors
/// Returns [Error::DuplicateCategoryName] if a category with the same name
/// already exists, or [Error::SqlError] for any other SQL error.
pub fn create_category(
    name: &CategoryName,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("INSERT INTO category (name, kind) VALUES (?1, ?2) RETURNING id, name, kind")?
        .query_row((name.as_ref(), kind), map_row_to_category)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCategoryName(name.as_ref().to_owned()),
            error => error.into(),
        })
}

/// Retrieve the category `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such category.
pub fn get_category(id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, kind FROM category WHERE id = :id")?
        .query_row(&[(":id", &id)], map_row_to_category)
        .map_err(Error::from)
}

/// Get all categories, expenses first, then ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, kind FROM category
             ORDER BY kind = 'income', name COLLATE NOCASE",
        )?
        .query_map([], map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Delete the category `id`.
///
/// Rules and transactions in the category are kept with no category, and
/// its budgets are deleted.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingCategory] if there is no category with `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM category WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Work out which foreign key a failed insert or update broke.
///
/// SQLite does not say which constraint failed, so a `category_id` that does
/// not exist is blamed first and the account otherwise.
pub(crate) fn foreign_key_error(
    account_id: Option<AccountId>,
    category_id: Option<CategoryId>,
    connection: &Connection,
) -> Error {
    match category_id {
        Some(id) if get_category(id, connection) == Err(Error::NotFound) => {
            Error::InvalidCategory(category_id)
        }
        _ => Error::InvalidAccount(account_id),
    }
}

fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
    })
}


#[cfg(test)]
mod category_query_tests {
    use crate::{Error, test_utils::get_test_connection};

    use super::{
        CategoryKind, CategoryName, create_category, delete_category, foreign_key_error,
        get_all_categories, get_category,
    };

    fn name(text: &str) -> CategoryName {
        CategoryName::new(text).unwrap()
    }

    #[test]
    fn create_and_get_category() {
        let connection = get_test_connection();

        let created =
            create_category(&name("Groceries"), CategoryKind::Expense, &connection).unwrap();

        assert!(created.id > 0);
        assert_eq!(created.kind, CategoryKind::Expense);
        assert_eq!(get_category(created.id, &connection), Ok(created));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let connection = get_test_connection();
        create_category(&name("Groceries"), CategoryKind::Expense, &connection).unwrap();

        let result = create_category(&name("Groceries"), CategoryKind::Income, &connection);

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Groceries".to_owned()))
        );
    }

    #[test]
    fn lists_expenses_before_income() {
        let connection = get_test_connection();
        let wages = create_category(&name("Wages"), CategoryKind::Income, &connection).unwrap();
        let rent = create_category(&name("rent"), CategoryKind::Expense, &connection).unwrap();
        let food = create_category(&name("Food"), CategoryKind::Expense, &connection).unwrap();

        let got = get_all_categories(&connection).unwrap();

        assert_eq!(got, vec![food, rent, wages]);
    }

    #[test]
    fn delete_category_removes_it() {
        let connection = get_test_connection();
        let food = create_category(&name("Food"), CategoryKind::Expense, &connection).unwrap();

        assert_eq!(delete_category(food.id, &connection), Ok(()));
        assert_eq!(get_category(food.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_missing_category_fails() {
        let connection = get_test_connection();

        assert_eq!(
            delete_category(42, &connection),
            Err(Error::DeleteMissingCategory)
        );
    }

    #[test]
    fn blames_missing_category_before_account() {
        let connection = get_test_connection();
        let food = create_category(&name("Food"), CategoryKind::Expense, &connection).unwrap();

        assert_eq!(
            foreign_key_error(Some(3), Some(42), &connection),
            Error::InvalidCategory(Some(42))
        );
        assert_eq!(
            foreign_key_error(Some(3), Some(food.id), &connection),
            Error::InvalidAccount(Some(3))
        );
    }
}
