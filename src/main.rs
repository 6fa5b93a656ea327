mod cli;
mod error;
mod report;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use crate::report::ConsoleReporter;
use clap::Parser;
use ctfix_config::Settings;
use ctfix_fixer::{Coordinator, ExtensionGuesser, FixOptions, RunConfig, RunSummary};
use ctfix_storage::backend::S3Backend;
use exn::ResultExt;
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

/// Conventional exit status for a process stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(summary) if summary.interrupted => ExitCode::from(EXIT_INTERRUPTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `info` with `--verbose`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<RunSummary> {
    let interrupt = interrupt_signal();
    let settings = Settings::load(&cli.overrides()).or_raise(|| ErrorKind::Config)?;

    let store = S3Backend::new(
        &settings.bucket,
        &settings.region,
        settings.endpoint.as_deref(),
        &settings.access_key,
        &settings.secret_key,
    )
    .await
    .or_raise(|| ErrorKind::Storage)?;

    let coordinator = Coordinator::new(Arc::new(store), Arc::new(ExtensionGuesser), Arc::new(ConsoleReporter));
    let summary = coordinator
        .run_until_interrupted(&run_config(&settings), interrupt)
        .await
        .or_raise(|| ErrorKind::Run)?;

    if summary.unqueued > 0 || summary.workers_timed_out > 0 || summary.workers_closed > 0 || summary.workers_aborted > 0 {
        tracing::warn!(
            unqueued = summary.unqueued,
            timed_out = summary.workers_timed_out,
            closed = summary.workers_closed,
            aborted = summary.workers_aborted,
            "Not every key was processed"
        );
    }
    Ok(summary)
}

fn run_config(settings: &Settings) -> RunConfig {
    RunConfig {
        prefixes: settings.prefixes.clone(),
        workers: settings.workers,
        options: FixOptions {
            verbose: settings.verbose,
            dry_run: settings.dry_run,
            queue_timeout: settings.queue_timeout(),
        },
        ..RunConfig::default()
    }
}

/// Listen for Ctrl-C from now on.
///
/// The handler is installed by a background task started before settings are
/// even loaded, so a Ctrl-C while keys are still being queued is absorbed
/// instead of killing the process mid-rewrite. The returned
/// future resolves on the first one, and never resolves if the handler
/// can't be installed.
fn interrupt_signal() -> impl Future<Output = ()> {
    let (fire, fired) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = fire.send(());
            },
            Err(err) => tracing::warn!(error = %err, "Could not listen for Ctrl-C"),
        }
    });
    async move {
        if fired.await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
