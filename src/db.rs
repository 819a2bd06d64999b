//! Database initialization.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, budget::create_budget_table,
    category::create_category_table, recurring::create_recurring_rule_table,
    transaction::create_transaction_table,
};

/// Create the tables for the domain models if they do not exist.
///
/// Foreign key enforcement is switched on for `connection`.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_recurring_rule_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
