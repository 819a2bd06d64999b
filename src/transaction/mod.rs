//! Transactions: money spent or earned on a date.
//!
//! Recurring rules create transactions when their occurrences fall due, see
//! [crate::recurring::run_due_rules].

mod core;
mod transactions_page;

pub use core::{
    Transaction, TransactionId, count_transactions, create_transaction, create_transaction_table,
    get_transaction, get_transactions_for_rule,
};
pub use transactions_page::get_transactions_page;
