use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use cadence::{
    BudgetMonth, CategoryKind, CategoryName, RuleForm, create_account, create_budget,
    create_category, create_recurring_rule, initialize_db, recurrence::Frequency,
};

/// A utility for creating a test database for the cadence web server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating accounts...");
    let everyday = create_account("Everyday", &conn)?;
    let savings = create_account("Savings", &conn)?;

    println!("Creating categories...");
    let housing = create_category(&CategoryName::new("Housing")?, CategoryKind::Expense, &conn)?;
    let food = create_category(&CategoryName::new("Food")?, CategoryKind::Expense, &conn)?;
    let wages = create_category(&CategoryName::new("Wages")?, CategoryKind::Income, &conn)?;

    println!("Creating recurring rules...");
    let today = OffsetDateTime::now_utc().date();
    let two_months_ago = today.saturating_sub(Duration::days(60));

    let forms = [
        RuleForm {
            name: "Rent".to_owned(),
            description_template: "Rent payment".to_owned(),
            amount: -450.0,
            account_id: Some(everyday.id),
            category_id: Some(housing.id),
            frequency: Frequency::Weekly,
            ..RuleForm::blank(two_months_ago)
        },
        RuleForm {
            name: "Salary".to_owned(),
            description_template: "Salary".to_owned(),
            amount: 3200.0,
            account_id: Some(everyday.id),
            category_id: Some(wages.id),
            frequency: Frequency::Monthly,
            day_of_month: Some(15),
            ..RuleForm::blank(two_months_ago)
        },
        RuleForm {
            name: "Savings transfer".to_owned(),
            description_template: "Transfer to savings".to_owned(),
            amount: 250.0,
            account_id: Some(savings.id),
            frequency: Frequency::Monthly,
            interval: 2,
            day_of_month: Some(31),
            max_executions: Some(6),
            ..RuleForm::blank(two_months_ago)
        },
        RuleForm {
            name: "Car insurance".to_owned(),
            description_template: "Car insurance premium".to_owned(),
            amount: -180.0,
            account_id: Some(everyday.id),
            frequency: Frequency::Quarterly,
            ..RuleForm::blank(today)
        },
        RuleForm {
            name: "Coffee".to_owned(),
            description_template: "Flat white".to_owned(),
            amount: -5.5,
            category_id: Some(food.id),
            frequency: Frequency::Daily,
            end_date: Some(today.saturating_add(Duration::days(14))),
            notes: Some("Cutting back after this fortnight.".to_owned()),
            ..RuleForm::blank(today.saturating_sub(Duration::days(3)))
        },
    ];

    for form in forms {
        let draft = form.validate()?;
        let rule = create_recurring_rule(&draft, &conn)?;
        println!("  #{} {}: {}", rule.id, rule.name, rule.schedule.describe());
    }

    println!("Creating budgets...");
    let this_month = BudgetMonth::containing(today);
    create_budget(housing.id, this_month, 2000.0, &conn)?;
    create_budget(food.id, this_month, 120.0, &conn)?;

    println!("Success!");

    Ok(())
}
