use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Date, macros::format_description};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use cadence::{RunOptions, RunSummary, get_local_offset, initialize_db, local_today, run_due_rules};

/// Create the transactions for every recurring rule occurrence that has fallen due.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// Run the rules as of this date (YYYY-MM-DD). Defaults to today in `--timezone`.
    #[arg(long, value_parser = parse_date)]
    date: Option<Date>,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// Print what would be created without saving anything.
    #[arg(long)]
    dry_run: bool,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,

    /// Only run the rule with this ID. May be repeated.
    #[arg(long = "rule-id")]
    rule_ids: Vec<i64>,

    /// The most occurrences of a single rule created in this run.
    #[arg(long, default_value_t = RunOptions::default().max_catch_up)]
    max_catch_up: u32,
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("\"{text}\" is not a date in the format YYYY-MM-DD: {error}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter::LevelFilter::INFO),
        )
        .init();

    if !Path::new(&args.db_path).is_file() {
        eprintln!("No database found at {:#?}", args.db_path);
        exit(1);
    }

    if get_local_offset(&args.timezone).is_none() {
        eprintln!("\"{}\" is not a canonical timezone name.", args.timezone);
        exit(1);
    }

    let as_of = match args.date {
        Some(date) => date,
        None => local_today(&args.timezone)?,
    };

    let connection = Connection::open(&args.db_path)?;
    initialize_db(&connection)?;

    let options = RunOptions {
        dry_run: args.dry_run,
        rule_ids: (!args.rule_ids.is_empty()).then_some(args.rule_ids),
        max_catch_up: args.max_catch_up,
    };

    let summary = run_due_rules(&connection, as_of, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if !summary.errors.is_empty() {
        exit(2);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let heading = if summary.dry_run {
        "Dry run of due rules"
    } else {
        "Ran due rules"
    };
    println!("{heading} as of {}", summary.as_of);

    for execution in &summary.executions {
        match execution.transaction_id {
            Some(transaction_id) => println!(
                "  rule #{} {} {:>10.2} {} (transaction #{transaction_id})",
                execution.rule_id, execution.date, execution.amount, execution.description
            ),
            None => println!(
                "  rule #{} {} {:>10.2} {}",
                execution.rule_id, execution.date, execution.amount, execution.description
            ),
        }
    }

    for error in &summary.errors {
        println!("  error: {error}");
    }

    println!(
        "{} transactions from {} of {} due rules.",
        summary.transactions_created, summary.rules_executed, summary.total_rules
    );
}
