use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::macros::date;

use crate::{
    app_state::RecurringConfig,
    db::initialize,
    recurrence::Frequency,
    recurring::{RecurringRule, RecurringState, RuleForm, create_recurring_rule},
};

#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize(&connection).expect("could not initialize test DB");

    connection
}

pub(crate) fn get_test_state() -> RecurringState {
    RecurringState {
        db_connection: Arc::new(Mutex::new(get_test_connection())),
        local_timezone: "Etc/UTC".to_owned(),
        recurring_config: RecurringConfig::default(),
    }
}

/// A monthly rent payment on the 1st, starting 2025-01-01.
pub(crate) fn rent_form() -> RuleForm {
    RuleForm {
        name: "Rent".to_owned(),
        description_template: "Rent payment".to_owned(),
        amount: -450.0,
        frequency: Frequency::Monthly,
        day_of_month: Some(1),
        ..RuleForm::blank(date!(2025 - 01 - 01))
    }
}

#[track_caller]
pub(crate) fn must_create_rule(form: RuleForm, connection: &Connection) -> RecurringRule {
    let draft = form.validate().expect("invalid test rule");
    create_recurring_rule(&draft, connection).expect("could not create test rule")
}
