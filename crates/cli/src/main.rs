//! Conduit CLI: fetch URLs concurrently through the transaction manager.
//!
//! Every URL is submitted up front; the main thread then drives the manager
//! until all transactions complete, prints one line per request as its
//! callback fires, releases every handle and prints a summary.
//!
//! Exit code is 1 if any request did not end `ok`.

mod commands;
mod format;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use conduit_concurrency::TransactionManager;
use conduit_core::{ClientConfig, CONFIG_FILE_NAME};
use conduit_engine::HttpEngine;
use parking_lot::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::{build_cli, matches_to_invocation, Invocation};
use format::{format_error, format_report, format_summary, OutputMode, RequestReport};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    let output = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match matches_to_invocation(&matches).and_then(run) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{}", format_error(&e, output));
            process::exit(1);
        }
    }
}

/// Returns whether every request succeeded.
fn run(invocation: Invocation) -> anyhow::Result<bool> {
    if invocation.init_config {
        let path = invocation
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        ClientConfig::write_default_if_missing(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("{}", path.display());
        return Ok(true);
    }

    let config = load_config(invocation.config.as_deref())?;
    let engine = HttpEngine::with_config(&config).context("starting HTTP engine")?;
    let manager = TransactionManager::new(engine);
    let reports: Arc<Mutex<Vec<RequestReport>>> = Arc::new(Mutex::new(Vec::new()));
    let output = invocation.output;

    let started = Instant::now();
    let mut handles = Vec::with_capacity(invocation.requests.len());
    for spec in invocation.requests {
        let url = spec.url().to_owned();
        let reports = Arc::clone(&reports);
        let handle = manager
            .submit(spec, move |view, body| {
                let report = RequestReport::from_view(view, body);
                println!("{}", format_report(&report, output));
                reports.lock().push(report);
            })
            .with_context(|| format!("submitting {}", url))?;
        handles.push(handle);
    }

    while !handles.iter().all(|handle| manager.is_completed(*handle)) {
        manager.poll();
        thread::sleep(POLL_INTERVAL);
    }

    for handle in &handles {
        manager.release(*handle);
    }
    debug!(target: "conduit::txn", metrics = ?manager.metrics(), "All transactions released");

    let reports = reports.lock();
    let failed = reports.iter().filter(|r| !r.outcome.is_ok()).count();
    println!(
        "{}",
        format_summary(reports.len(), failed, started.elapsed(), output)
    );
    Ok(failed == 0)
}

/// Explicit `--config` must exist; the default file is optional.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<ClientConfig> {
    match explicit {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => {
            let path = Path::new(CONFIG_FILE_NAME);
            if path.exists() {
                ClientConfig::from_file(path)
                    .with_context(|| format!("loading config {}", path.display()))
            } else {
                Ok(ClientConfig::default())
            }
        }
    }
}
