//! Accounts that transactions, including those created by recurring rules, are booked to.

mod accounts_page;
mod core;
mod create;

pub use accounts_page::get_accounts_page;
pub use core::{Account, AccountId, create_account, create_account_table, get_all_accounts};
pub use create::{create_account_endpoint, get_new_account_page};
