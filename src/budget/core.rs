//! The budget model, the month it covers and its database queries.

use rusqlite::{Connection, Row};
use time::{Date, Month};

use crate::{
    Error,
    category::{CategoryId, CategoryKind},
    database_id::DatabaseId,
    recurrence::with_day_clamped,
};

/// The database id of a [Budget].
pub type BudgetId = DatabaseId;

/// The earliest year a budget can be set for.
pub const MIN_BUDGET_YEAR: i32 = 2000;
/// The latest year a budget can be set for.
pub const MAX_BUDGET_YEAR: i32 = 2100;

/// The share of a budget at which it is reported as near its limit.
const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// A calendar month, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BudgetMonth {
    first_day: Date,
}

impl BudgetMonth {
    /// The month numbered `month` (1 to 12) in `year`.
    ///
    /// # Errors
    /// Returns a message suitable for showing beneath a form if `year` is
    /// outside [MIN_BUDGET_YEAR] to [MAX_BUDGET_YEAR] or `month` is not a
    /// month number.
    pub fn new(year: i32, month: u8) -> Result<Self, String> {
        if !(MIN_BUDGET_YEAR..=MAX_BUDGET_YEAR).contains(&year) {
            return Err(format!(
                "Error: Year must be between {MIN_BUDGET_YEAR} and {MAX_BUDGET_YEAR}"
            ));
        }

        let month = Month::try_from(month)
            .map_err(|_| "Error: Month must be between 1 and 12".to_owned())?;

        Date::from_calendar_date(year, month, 1)
            .map(|first_day| Self { first_day })
            .map_err(|error| format!("Error: {error}"))
    }

    /// The month `date` falls in.
    pub fn containing(date: Date) -> Self {
        Self {
            first_day: with_day_clamped(date, 1),
        }
    }

    /// The calendar year, e.g. 2025.
    pub fn year(self) -> i32 {
        self.first_day.year()
    }

    pub fn month(self) -> Month {
        self.first_day.month()
    }

    /// The month number, 1 for January.
    pub fn month_number(self) -> u8 {
        u8::from(self.first_day.month())
    }

    /// The first of the month.
    pub fn first_day(self) -> Date {
        self.first_day
    }

    /// The last day of the month, e.g. February 29 in leap years.
    pub fn last_day(self) -> Date {
        with_day_clamped(self.first_day, 31)
    }

    /// The month before, `None` at the start of the calendar.
    pub fn previous(self) -> Option<Self> {
        self.first_day.previous_day().map(Self::containing)
    }

    /// The month after, `None` at the end of the calendar.
    pub fn next(self) -> Option<Self> {
        self.last_day().next_day().map(Self::containing)
    }

    /// The month as it is shown on pages, e.g. "March 2025".
    pub fn label(self) -> String {
        format!("{} {}", self.month(), self.year())
    }
}

/// A spending limit for one expense category in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub category_id: CategoryId,
    pub year: i32,
    /// The month number, 1 for January.
    pub month: u8,
    /// The most that should be spent, always positive.
    pub amount: f64,
}

/// How spending compares with a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Less than 80% spent.
    OnTrack,
    /// At least 80% spent.
    NearLimit,
    /// The whole budget or more spent.
    Exceeded,
}

impl BudgetStatus {
    pub fn display_name(self) -> &'static str {
        match self {
            BudgetStatus::OnTrack => "On track",
            BudgetStatus::NearLimit => "Near limit",
            BudgetStatus::Exceeded => "Exceeded",
        }
    }
}

/// A budget with what has been spent against it.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetProgress {
    pub budget: Budget,
    pub category_name: String,
    /// The net amount spent in the category over the month. Refunds count
    /// against spending.
    pub spent: f64,
}

impl BudgetProgress {
    /// The share of the budget spent, as a percentage.
    pub fn percent_used(&self) -> f64 {
        self.spent / self.budget.amount * 100.0
    }

    pub fn remaining(&self) -> f64 {
        self.budget.amount - self.spent
    }

    pub fn status(&self) -> BudgetStatus {
        let percent_used = self.percent_used();

        if percent_used >= 100.0 {
            BudgetStatus::Exceeded
        } else if percent_used >= NEAR_LIMIT_PERCENT {
            BudgetStatus::NearLimit
        } else {
            BudgetStatus::OnTrack
        }
    }
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            amount REAL NOT NULL CHECK (amount > 0),
            UNIQUE(category_id, year, month),
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_year_month ON budget(year, month)",
        (),
    )?;

    Ok(())
}

/// Set a budget of `amount` for `category_id` in `month`.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateBudget] if the category already has a budget that month,
/// - [Error::InvalidCategory] if the category ID does not refer to a category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    category_id: CategoryId,
    month: BudgetMonth,
    amount: f64,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(
            "INSERT INTO budget (category_id, year, month, amount) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, category_id, year, month, amount",
        )?
        .query_row(
            (category_id, month.year(), month.month_number(), amount),
            map_row_to_budget,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateBudget,
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(Some(category_id)),
            error => error.into(),
        })
}

/// The budgets set for `month` with what was spent in each category,
/// ordered by category name.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_budget_progress(
    month: BudgetMonth,
    connection: &Connection,
) -> Result<Vec<BudgetProgress>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.category_id, b.year, b.month, b.amount, c.name, c.kind,
                (SELECT COALESCE(SUM(t.amount), 0.0) FROM \"transaction\" t
                 WHERE t.category_id = b.category_id AND t.date BETWEEN ?3 AND ?4)
             FROM budget b
             INNER JOIN category c ON c.id = b.category_id
             WHERE b.year = ?1 AND b.month = ?2
             ORDER BY c.name COLLATE NOCASE",
        )?
        .query_map(
            (
                month.year(),
                month.month_number(),
                month.first_day(),
                month.last_day(),
            ),
            |row| {
                let kind: CategoryKind = row.get(6)?;
                let total: f64 = row.get(7)?;

                Ok(BudgetProgress {
                    budget: map_row_to_budget(row)?,
                    category_name: row.get(5)?,
                    spent: match kind {
                        CategoryKind::Expense => -total,
                        CategoryKind::Income => total,
                    },
                })
            },
        )?
        .map(|maybe_progress| maybe_progress.map_err(Error::from))
        .collect()
}

/// Delete the budget `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingBudget] if there is no budget with `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_budget(id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM budget WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

fn map_row_to_budget(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        category_id: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        amount: row.get(4)?,
    })
}



#[cfg(test)]
mod budget_query_tests {
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryKind, CategoryName, create_category, delete_category},
        test_utils::get_test_connection,
        transaction::{Transaction, create_transaction},
    };

    use super::{BudgetMonth, create_budget, delete_budget, get_budget_progress};

    fn march() -> BudgetMonth {
        BudgetMonth::new(2025, 3).unwrap()
    }

    #[test]
    fn one_budget_per_category_and_month() {
        let connection = get_test_connection();
        let groceries = create_category(
            &CategoryName::new("Groceries").unwrap(),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();

        let budget = create_budget(groceries.id, march(), 500.0, &connection).unwrap();
        let duplicate = create_budget(groceries.id, march(), 300.0, &connection);
        let next_month = create_budget(groceries.id, march().next().unwrap(), 300.0, &connection);

        assert_eq!(budget.year, 2025);
        assert_eq!(budget.month, 3);
        assert_eq!(duplicate, Err(Error::DuplicateBudget));
        assert!(next_month.is_ok());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let connection = get_test_connection();

        assert_eq!(
            create_budget(7, march(), 500.0, &connection),
            Err(Error::InvalidCategory(Some(7)))
        );
    }

    #[test]
    fn progress_counts_only_the_month_and_category() {
        let connection = get_test_connection();
        let groceries = create_category(
            &CategoryName::new("Groceries").unwrap(),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();
        let dining = create_category(
            &CategoryName::new("Dining").unwrap(),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();
        create_budget(groceries.id, march(), 500.0, &connection).unwrap();
        for (amount, date, category_id) in [
            (-120.0, date!(2025 - 03 - 01), groceries.id),
            (-80.5, date!(2025 - 03 - 31), groceries.id),
            (20.5, date!(2025 - 03 - 15), groceries.id),
            (-60.0, date!(2025 - 02 - 28), groceries.id),
            (-60.0, date!(2025 - 04 - 01), groceries.id),
            (-45.0, date!(2025 - 03 - 10), dining.id),
        ] {
            create_transaction(
                Transaction::build(amount, date, "Shop").category_id(Some(category_id)),
                &connection,
            )
            .unwrap();
        }

        let progress = get_budget_progress(march(), &connection).unwrap();

        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].category_name, "Groceries");
        assert_eq!(progress[0].spent, 180.0);
        assert_eq!(progress[0].remaining(), 320.0);
    }

    #[test]
    fn deleting_category_deletes_its_budgets() {
        let connection = get_test_connection();
        let groceries = create_category(
            &CategoryName::new("Groceries").unwrap(),
            CategoryKind::Expense,
            &connection,
        )
        .unwrap();
        create_budget(groceries.id, march(), 500.0, &connection).unwrap();

        delete_category(groceries.id, &connection).unwrap();

        assert_eq!(get_budget_progress(march(), &connection), Ok(vec![]));
    }

    #[test]
    fn delete_missing_budget_fails() {
        let connection = get_test_connection();

        assert_eq!(delete_budget(1, &connection), Err(Error::DeleteMissingBudget));
    }
}
