//! Categories label transactions and recurring rules, e.g. "Groceries" or "Wages".
//!
//! Deleting a category keeps the rules and transactions that used it with no
//! category, and deletes its budgets.

mod core;
mod create;
mod delete;
mod list;

pub use core::{
    Category, CategoryId, CategoryKind, CategoryName, create_category, create_category_table,
    delete_category, get_all_categories, get_category,
};
pub(crate) use core::foreign_key_error;
pub use create::{create_category_endpoint, get_new_category_page};
pub use delete::delete_category_endpoint;
pub use list::get_categories_page;
