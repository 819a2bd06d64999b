//! Monthly budgets: a spending limit for an expense category in one month.
//!
//! The budgets page compares each limit with the category's transactions
//! that month and with the occurrences its recurring rules have yet to book.

mod budgets_page;
mod core;
mod create;
mod delete;

pub use budgets_page::get_budgets_page;
pub use core::{BudgetMonth, create_budget, create_budget_table};
pub use create::{create_budget_endpoint, get_new_budget_page};
pub use delete::delete_budget_endpoint;
