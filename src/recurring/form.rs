use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    account::{Account, get_all_accounts},
    category::{Category, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, FORM_HINT_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    recurrence::{Frequency, numbered_weekdays, weekday_abbreviation},
    recurring::models::{MAX_FORM_INTERVAL, RuleForm, RuleId},
};

/// Where the rule form is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormTarget {
    Create,
    Update(RuleId),
}

/// The accounts and categories a rule may refer to.
#[derive(Debug, Default)]
pub(crate) struct FormChoices {
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
}

impl FormChoices {
    pub fn load(connection: &Connection) -> Result<Self, Error> {
        Ok(Self {
            accounts: get_all_accounts(connection)?,
            categories: get_all_categories(connection)?,
        })
    }
}

/// The form for creating or editing a recurring rule.
///
/// Validation errors replace the whole form, so `error_message` is rendered
/// at the top.
pub(crate) fn rule_form_view(
    target: FormTarget,
    form: &RuleForm,
    choices: &FormChoices,
    error_message: &str,
) -> Markup {
    let (hx_post, hx_put, submit_label) = match target {
        FormTarget::Create => (Some(endpoints::POST_RECURRING.to_owned()), None, "Create Rule"),
        FormTarget::Update(rule_id) => (
            None,
            Some(format_endpoint(endpoints::RECURRING_RULE, rule_id)),
            "Update Rule",
        ),
    };

    let amount = (form.amount != 0.0).then(|| format!("{:.2}", form.amount));

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    value=(form.name)
                    placeholder="e.g., Rent"
                    maxlength="100"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description_template" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    id="description_template"
                    type="text"
                    name="description_template"
                    value=(form.description_template)
                    maxlength="255"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                span class={ "block " (FORM_HINT_STYLE) }
                {
                    "Used as the description of each transaction this rule creates"
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="0.01"
                    value=[amount]
                    placeholder="-0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                span class={ "block " (FORM_HINT_STYLE) }
                {
                    "Negative for expenses, positive for income"
                }
            }

            @if !choices.accounts.is_empty() {
                div
                {
                    label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

                    select id="account_id" name="account_id" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "No account" }

                        @for account in &choices.accounts {
                            option
                                value=(account.id)
                                selected[form.account_id == Some(account.id)]
                            {
                                (account.name)
                            }
                        }
                    }
                }
            }

            @if !choices.categories.is_empty() {
                div
                {
                    label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                    select id="category_id" name="category_id" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "Uncategorized" }

                        @for category in &choices.categories {
                            option
                                value=(category.id)
                                selected[form.category_id == Some(category.id)]
                            {
                                (category.name) " (" (category.kind.display_name()) ")"
                            }
                        }
                    }
                }
            }

            div class="grid grid-cols-2 gap-4"
            {
                div
                {
                    label for="frequency" class=(FORM_LABEL_STYLE) { "Frequency" }

                    select id="frequency" name="frequency" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for frequency in Frequency::ALL {
                            option
                                value=(frequency.as_str())
                                selected[form.frequency == frequency]
                            {
                                (frequency.display_name())
                            }
                        }
                    }
                }

                div
                {
                    label for="interval" class=(FORM_LABEL_STYLE) { "Every" }

                    input
                        id="interval"
                        type="number"
                        name="interval"
                        min="1"
                        max=(MAX_FORM_INTERVAL)
                        value=(form.interval)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="day_of_month" class=(FORM_LABEL_STYLE) { "Day of month" }

                input
                    id="day_of_month"
                    type="number"
                    name="day_of_month"
                    min="1"
                    max="31"
                    value=[form.day_of_month]
                    class=(FORM_TEXT_INPUT_STYLE);

                span class={ "block " (FORM_HINT_STYLE) }
                {
                    "Monthly and quarterly rules only. Short months use their last day."
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Days of week" }

                div class="flex flex-wrap gap-3"
                {
                    @for (number, weekday) in numbered_weekdays() {
                        label class="flex items-center gap-1 text-sm"
                        {
                            input
                                type="checkbox"
                                name="days_of_week"
                                value=(number)
                                checked[form.days_of_week.contains(&number)];

                            (weekday_abbreviation(weekday))
                        }
                    }
                }

                span class={ "block " (FORM_HINT_STYLE) } { "Weekly rules only" }
            }

            div class="grid grid-cols-2 gap-4"
            {
                div
                {
                    label for="start_date" class=(FORM_LABEL_STYLE) { "Start date" }

                    input
                        id="start_date"
                        type="date"
                        name="start_date"
                        value=(form.start_date)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="end_date" class=(FORM_LABEL_STYLE) { "End date" }

                    input
                        id="end_date"
                        type="date"
                        name="end_date"
                        value=[form.end_date]
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="max_executions" class=(FORM_LABEL_STYLE) { "Maximum occurrences" }

                input
                    id="max_executions"
                    type="number"
                    name="max_executions"
                    min="1"
                    value=[form.max_executions]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="notes" class=(FORM_LABEL_STYLE) { "Notes" }

                textarea id="notes" name="notes" rows="2" class=(FORM_TEXT_INPUT_STYLE)
                {
                    (form.notes.as_deref().unwrap_or_default())
                }
            }

            label class="flex items-center gap-2 text-sm"
            {
                input type="checkbox" name="enabled" value="true" checked[form.enabled];
                "Enabled"
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_label) }
        }
    }
}
