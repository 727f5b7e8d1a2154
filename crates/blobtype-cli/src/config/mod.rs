//! CLI configuration management.
//!
//! ```text
//! Cli
//! └── azure: AzureConfig   # Account name, account key, container
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! blobtype -n myaccount -k "$KEY" -c media
//!
//! # Or via environment variables
//! AZURE_STORAGE_ACCOUNT=myaccount AZURE_STORAGE_KEY="$KEY" AZURE_STORAGE_CONTAINER=media blobtype
//! ```

use std::process;

use anyhow::Context;
use blobtype_azure::AzureConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "blobtype")]
#[command(about = "Reset blob content-types from their name extensions")]
#[command(version)]
pub struct Cli {
    /// Storage account and container to scan.
    #[clap(flatten)]
    pub azure: AzureConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.azure
            .validate()
            .context("invalid storage configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            account = %self.azure.account_name,
            container = %self.azure.container,
            page_size = self.azure.effective_page_size(),
            timeout_secs = self.azure.effective_timeout().as_secs(),
            "Storage configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
