#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod report;
mod shutdown;
mod telemetry;

use std::process;

use anyhow::Context;
use blobtype_azure::AzureBlobClient;
use blobtype_core::{ContentTypeReset, UpdateSummary};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "blobtype_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "blobtype_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "blobtype_cli::config";

/// Exit code used when a signal interrupts the scan.
const EXIT_INTERRUPTED: i32 = 130;

/// How a run ended without error.
enum RunStatus {
    /// The listing was exhausted.
    Completed,
    /// A signal stopped the scan between objects.
    Interrupted,
}

#[tokio::main]
async fn main() {
    let error = match run().await {
        Ok(RunStatus::Completed) => {
            tracing::info!(
                target: TRACING_TARGET_SHUTDOWN,
                "application terminated successfully"
            );
            process::exit(0);
        }
        Ok(RunStatus::Interrupted) => {
            tracing::warn!(
                target: TRACING_TARGET_SHUTDOWN,
                "scan interrupted before the listing was exhausted"
            );
            process::exit(EXIT_INTERRUPTED);
        }
        Err(error) => error,
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<RunStatus> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    cli.log();
    cli.validate()?;

    let client = AzureBlobClient::connect(&cli.azure)
        .await
        .with_context(|| {
            format!("failed to connect to container '{}'", cli.azure.container)
        })?;

    let cancel_token = CancellationToken::new();
    let signal_task = tokio::spawn({
        let cancel_token = cancel_token.clone();
        async move {
            shutdown::shutdown_signal().await;
            cancel_token.cancel();
        }
    });

    let reset = ContentTypeReset::default().with_cancellation(cancel_token);
    let mut totals = UpdateSummary::default();
    let result = reset
        .run(&client, |object, outcome| {
            totals.record(outcome);
            report::print_outcome(object, outcome);
        })
        .await;
    signal_task.abort();

    let summary = match result {
        Ok(summary) => summary,
        Err(error) => {
            report::print_summary(&totals);
            return Err(anyhow::Error::new(error).context("content-type scan failed"));
        }
    };

    report::print_summary(&summary);
    if summary.interrupted {
        Ok(RunStatus::Interrupted)
    } else {
        Ok(RunStatus::Completed)
    }
}
