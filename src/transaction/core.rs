//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::AccountId,
    category::{CategoryId, foreign_key_error},
    database_id::DatabaseId,
    recurring::RuleId,
};

pub type TransactionId = DatabaseId;

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The account the transaction was booked to.
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    /// The recurring rule that created this transaction, if any.
    pub recurring_rule_id: Option<RuleId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, date: Date, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            description: description.to_owned(),
            account_id: None,
            category_id: None,
            recurring_rule_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Pass the builder to [create_transaction] to insert it into the database.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction.
    ///
    /// Positive values represent income/credits, negative values represent
    /// expenses/debits.
    pub amount: f64,

    /// The date when the transaction occurred.
    pub date: Date,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The account the transaction is booked to.
    pub account_id: Option<AccountId>,

    /// What the money was spent on or earned from.
    pub category_id: Option<CategoryId>,

    /// The recurring rule the transaction was materialized from.
    pub recurring_rule_id: Option<RuleId>,
}

impl TransactionBuilder {
    /// Set the account for the transaction.
    pub fn account_id(mut self, account_id: Option<AccountId>) -> Self {
        self.account_id = account_id;
        self
    }

    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Link the transaction to the recurring rule that created it.
    pub fn recurring_rule_id(mut self, recurring_rule_id: Option<RuleId>) -> Self {
        self.recurring_rule_id = recurring_rule_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table.
///
/// Deleting an account, category or recurring rule keeps its transactions
/// and clears the link.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            account_id INTEGER,
            category_id INTEGER,
            recurring_rule_id INTEGER,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(recurring_rule_id) REFERENCES recurring_rule(id) ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_recurring_rule_id
         ON \"transaction\"(recurring_rule_id)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_category_id
         ON \"transaction\"(category_id)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date)",
        (),
    )?;

    Ok(())
}

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to a category,
/// - [Error::InvalidAccount] if the account ID or recurring rule ID does not
///   refer to an existing row,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\"
                (amount, date, description, account_id, category_id, recurring_rule_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, amount, date, description, account_id, category_id, recurring_rule_id",
        )?
        .query_row(
            (
                builder.amount,
                builder.date,
                &builder.description,
                builder.account_id,
                builder.category_id,
                builder.recurring_rule_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => foreign_key_error(builder.account_id, builder.category_id, connection),
            error => error.into(),
        })
}

/// Retrieve a transaction by `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such transaction.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, amount, date, description, account_id, category_id, recurring_rule_id
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(Error::from)
}

/// The most recent `limit` transactions created by the recurring rule `rule_id`,
/// newest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_transactions_for_rule(
    rule_id: RuleId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, date, description, account_id, category_id, recurring_rule_id
             FROM \"transaction\"
             WHERE recurring_rule_id = ?1
             ORDER BY date DESC, id DESC
             LIMIT ?2",
        )?
        .query_map((rule_id, limit), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// The number of transactions in the database.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM \"transaction\"", [], |row| {
        row.get(0)
    })?;

    Ok(count.unsigned_abs())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        account_id: row.get(4)?,
        category_id: row.get(5)?,
        recurring_rule_id: row.get(6)?,
    })
}
