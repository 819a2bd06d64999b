use rusqlite::{Connection, Row};

use crate::{Error, database_id::DatabaseId};

/// The database id of an [Account].
pub type AccountId = DatabaseId;

/// A bank account or credit card that transactions are booked to.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The unique display name of the account.
    pub name: String,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
        (),
    )?;

    Ok(())
}

/// Create an account named `name`.
///
/// # Errors
/// Returns [Error::DuplicateAccountName] if an account with the same name
/// already exists, or [Error::SqlError] for any other SQL error.
pub fn create_account(name: &str, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("INSERT INTO account (name) VALUES (?1) RETURNING id, name")?
        .query_row((name,), map_row_to_account)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateAccountName(name.to_owned()),
            error => error.into(),
        })
}

/// Get all accounts ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, name FROM account ORDER BY name ASC")?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;

    Ok(Account { id, name })
}
