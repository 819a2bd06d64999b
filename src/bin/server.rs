use std::{error::Error, fs::OpenOptions, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use cadence::{
    AppState, RecurringConfig, build_router, get_local_offset, graceful_shutdown,
    logging_middleware,
};

/// The web server for cadence.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC", value_parser = parse_timezone)]
    timezone: String,

    /// File path to write the debug log to.
    #[arg(long, default_value = "debug.log")]
    log_path: String,

    /// The most occurrences of a single rule created in one run of the due rules.
    #[arg(long, default_value_t = RecurringConfig::default().max_catch_up)]
    max_catch_up: u32,

    /// How many days ahead the upcoming page looks by default.
    #[arg(long, default_value_t = RecurringConfig::default().upcoming_days)]
    upcoming_days: u32,
}

fn parse_timezone(timezone: &str) -> Result<String, String> {
    match get_local_offset(timezone) {
        Some(_) => Ok(timezone.to_owned()),
        None => Err(format!(
            "\"{timezone}\" is not a canonical timezone name, e.g. \"Pacific/Auckland\""
        )),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    setup_logging(&args.log_path)?;

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let connection = Connection::open(&args.db_path)
        .inspect_err(|error| tracing::error!("Could not open {}: {error}", args.db_path))?;
    let state = AppState::new(
        connection,
        &args.timezone,
        RecurringConfig {
            max_catch_up: args.max_catch_up,
            upcoming_days: args.upcoming_days,
        },
    )?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!(
        "HTTP server listening on http://{addr} with timezone {}",
        args.timezone
    );
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging(log_path: &str) -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(filter::LevelFilter::INFO);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // The handlers log their own errors.
        .on_failure(());

    router
        .layer(middleware::from_fn(logging_middleware))
        .layer(tracing_layer)
}
