//! # Awful Event Harvest
//!
//! Collects event records from a remote listing without tripping its rate
//! limits. A listing file names the events (upcoming and past); the
//! harvester visits each one in paced batches, extracts its fields and
//! keeps a deduplicated store of the results.
//!
//! ## Usage
//!
//! ```sh
//! awful_event_harvest run --links links.json --store events.json
//! awful_event_harvest export --store events.json --out-dir ./exports
//! awful_event_harvest clear --store events.json
//! ```
//!
//! Type `p` and Enter while a run is going to pause or resume it. A pause
//! takes effect once the batch in flight has resolved.
//!
//! ## Architecture
//!
//! 1. **Listing**: read and normalise the event identifiers
//! 2. **Scheduling**: split them into batches, upcoming before past
//! 3. **Collection**: navigate, settle, extract, up to `concurrentLimit` at a time
//! 4. **Storage**: upsert each record by identifier and persist the whole set

use clap::Parser;
use std::error::Error;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod errors;
mod listing;
mod models;
mod observer;
mod orchestrator;
mod source;
mod storage;
mod utils;

#[cfg(test)]
mod testing;

use cli::{Cli, Command, RunArgs};
use config::RunConfig;
use errors::HarvestError;
use models::{EventLinks, RunReport};
use observer::TracingObserver;
use orchestrator::dedup::DedupStore;
use orchestrator::pause::{PauseController, RunState};
use orchestrator::scheduler::BatchScheduler;
use source::{HttpItemSource, RetryingSource};
use storage::{JsonFileStore, MemoryStore, Persistence};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Run(run_args) => run(run_args).await?,
        Command::Export { store, out_dir } => {
            let store = JsonFileStore::new(store);
            match store.export_to(&out_dir).await? {
                Some(path) => info!(path = %path.display(), "Export written"),
                None => warn!(store = %store.path().display(), "Store is empty; nothing exported"),
            }
        }
        Command::Clear { store } => {
            JsonFileStore::new(store).clear().await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

async fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = RunConfig::load(args.config.as_deref(), &args.overrides()).await?;
    let links = listing::load_links(&args.links).await?;
    if links.is_empty() {
        warn!(path = %args.links.display(), "No event links to collect");
    }

    let http = HttpItemSource::new(&args.base_url).map_err(|e| {
        HarvestError::Configuration(format!("invalid base URL {}: {e}", args.base_url))
    })?;
    let source = RetryingSource::new(http, args.navigate_retries, Duration::from_secs(1));
    info!(base_url = %args.base_url, retries = args.navigate_retries, "Event source ready");

    let file_store = JsonFileStore::new(args.store.clone());
    let report = if args.dry_run {
        // Seed memory with what is on disk so skip/replace behave as in a real run.
        let existing = file_store.load_all().await.map_err(|e| {
            HarvestError::persistence(format!(
                "cannot load {}: {e}",
                file_store.path().display()
            ))
        })?;
        info!(existing = existing.len(), "Dry run; store file will not be written");
        execute(config, source, MemoryStore::with_records(existing), links).await?
    } else {
        execute(config, source, file_store, links).await?
    };

    info!(
        total = report.total,
        processed = report.processed,
        success = report.success,
        failed = report.failure_count(),
        skipped = report.skipped,
        requests = report.requests,
        batches = report.batches,
        success_rate = %format!("{}%", report.success_rate()),
        "Run summary"
    );
    for failure in &report.failures {
        error!(%failure, "Not collected");
    }
    Ok(())
}

#[instrument(level = "info", skip_all, fields(total = links.total()))]
async fn execute<P: Persistence>(
    config: RunConfig,
    source: RetryingSource<HttpItemSource>,
    persistence: P,
    links: EventLinks,
) -> Result<RunReport, Box<dyn Error>> {
    let store = DedupStore::load(persistence).await?;
    let mut scheduler = BatchScheduler::new(config, source, store, TracingObserver)?;

    spawn_pause_toggle(scheduler.pause_handle());
    let report = scheduler.run(links).await;

    Ok(report)
}

/// Toggle pause on every `p` line read from stdin.
///
/// Blocking reads live on a detached thread, never on the runtime.
fn spawn_pause_toggle(pause: Arc<PauseController>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    debug!(error = %e, "stdin unavailable; pause toggling disabled");
                    return;
                }
            };
            if !line.trim().eq_ignore_ascii_case("p") {
                continue;
            }
            match pause.toggle() {
                RunState::Paused => info!("Paused; the next batch waits for resume"),
                RunState::Running => info!("Resumed"),
                RunState::Completed => return,
            }
        }
    });
}
