//! Azure Blob Storage connection configuration.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use blobtype_core::Error;
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest page the List Blobs operation accepts.
pub const MAX_PAGE_SIZE: u32 = 5000;

/// Credentials and tuning for one Azure Blob Storage container.
///
/// # Environment Variables
///
/// With the `config` feature the required values can also be read from:
/// - `AZURE_STORAGE_ACCOUNT` - Storage account name
/// - `AZURE_STORAGE_KEY` - Storage account access key (base64)
/// - `AZURE_STORAGE_CONTAINER` - Blob container name
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(rename_all = "camelCase")]
#[must_use = "config does nothing unless you use it"]
pub struct AzureConfig {
    /// Storage account name.
    #[cfg_attr(
        feature = "config",
        arg(short = 'n', long = "account-name", env = "AZURE_STORAGE_ACCOUNT")
    )]
    pub account_name: String,

    /// Storage account access key (base64).
    #[cfg_attr(
        feature = "config",
        arg(
            short = 'k',
            long = "account-key",
            env = "AZURE_STORAGE_KEY",
            hide_env_values = true
        )
    )]
    #[serde(skip_serializing)]
    pub account_key: String,

    /// Blob container name.
    #[cfg_attr(
        feature = "config",
        arg(short = 'c', long = "container", env = "AZURE_STORAGE_CONTAINER")
    )]
    pub container: String,

    /// Service endpoint override (Azure Stack, Azurite).
    ///
    /// Defaults to `https://{account}.blob.core.windows.net`.
    #[cfg_attr(feature = "config", arg(skip))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Request timeout. Zero selects [`DEFAULT_TIMEOUT`].
    #[cfg_attr(feature = "config", arg(skip))]
    #[serde(default)]
    pub timeout: Duration,

    /// Objects requested per listing page. Zero selects [`MAX_PAGE_SIZE`].
    #[cfg_attr(feature = "config", arg(skip))]
    #[serde(default)]
    pub page_size: u32,
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("container", &self.container)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl AzureConfig {
    /// Creates a configuration for `container` in `account_name`.
    pub fn new(
        account_name: impl Into<String>,
        account_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_key: account_key.into(),
            container: container.into(),
            endpoint: None,
            timeout: Duration::ZERO,
            page_size: 0,
        }
    }

    /// Sets the service endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the listing page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Returns the effective page size, using the maximum if zero.
    pub fn effective_page_size(&self) -> u32 {
        if self.page_size == 0 {
            MAX_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    /// Returns the user agent sent with every request.
    pub fn user_agent(&self) -> String {
        format!("blobtype/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Returns the service endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint is not a valid base URL.
    pub fn endpoint_url(&self) -> Result<Url, Error> {
        let raw = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}.blob.core.windows.net", self.account_name),
        };

        let url = Url::parse(&raw).map_err(|e| {
            Error::configuration()
                .with_message(format!("invalid endpoint '{raw}'"))
                .with_source(e)
        })?;

        if url.cannot_be_a_base() {
            let message = format!("invalid endpoint '{raw}'");
            return Err(Error::configuration().with_message(message));
        }

        Ok(url)
    }

    /// Validates all configuration values.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - the account name or container name is empty
    /// - the account key is not valid base64
    /// - the page size exceeds [`MAX_PAGE_SIZE`]
    /// - the endpoint override is not a valid URL
    pub fn validate(&self) -> Result<(), Error> {
        if self.account_name.trim().is_empty() {
            return Err(Error::configuration().with_message("account name is empty"));
        }

        if self.container.trim().is_empty() {
            return Err(Error::configuration().with_message("container is empty"));
        }

        if let Err(e) = STANDARD.decode(self.account_key.trim()) {
            return Err(Error::configuration()
                .with_message("account key is not valid base64")
                .with_source(e));
        }

        if self.page_size > MAX_PAGE_SIZE {
            return Err(Error::configuration().with_message(format!(
                "page size {} exceeds the maximum of {MAX_PAGE_SIZE}",
                self.page_size
            )));
        }

        self.endpoint_url()?;
        Ok(())
    }
}
