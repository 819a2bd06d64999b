//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// Settings for projecting and materializing recurring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurringConfig {
    /// The most occurrences of a single rule materialized in one run.
    pub max_catch_up: u32,
    /// How many days ahead the upcoming page looks by default.
    pub upcoming_days: u32,
}

impl RecurringConfig {
    /// The largest window the upcoming page accepts.
    pub const MAX_UPCOMING_DAYS: u32 = 90;
}

impl Default for RecurringConfig {
    fn default() -> Self {
        Self {
            max_catch_up: 366,
            upcoming_days: 30,
        }
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The settings for recurring rules.
    pub recurring_config: RecurringConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        recurring_config: RecurringConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            recurring_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
