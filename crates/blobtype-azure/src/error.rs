//! Internal error types for blobtype-azure.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for blobtype-azure operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for blobtype-azure operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Response body could not be parsed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::de::DeError),
    /// The service answered with a non-success status.
    #[error("{status}{}", status_detail(code.as_deref(), message.as_deref()))]
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// Value of the `x-ms-error-code` header or the `Code` element.
        code: Option<String>,
        /// Human-readable message from the error body.
        message: Option<String>,
    },
    /// The account key is not valid base64.
    #[error("invalid account key: {0}")]
    InvalidKey(#[from] base64::DecodeError),
    /// A header value contains characters HTTP does not allow.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// The request date could not be formatted.
    #[error("date error: {0}")]
    Date(#[from] jiff::Error),
}

impl Error {
    /// Returns the storage error code, if the service sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Formats the optional error code and message that follow a status.
fn status_detail(code: Option<&str>, message: Option<&str>) -> String {
    let mut detail = String::new();
    if let Some(code) = code {
        detail.push(' ');
        detail.push_str(code);
    }
    if let Some(message) = message {
        detail.push_str(": ");
        detail.push_str(message);
    }
    detail
}

impl From<Error> for blobtype_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    blobtype_core::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    blobtype_core::Error::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_builder() {
                    blobtype_core::Error::invalid_input()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    blobtype_core::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Xml(e) => blobtype_core::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::Status { status, .. } => {
                let base = match status {
                    StatusCode::UNAUTHORIZED => blobtype_core::Error::authentication(),
                    StatusCode::FORBIDDEN if err.code() == Some("AuthenticationFailed") => {
                        blobtype_core::Error::authentication()
                    }
                    StatusCode::FORBIDDEN => blobtype_core::Error::authorization(),
                    StatusCode::NOT_FOUND => blobtype_core::Error::not_found(),
                    StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                        blobtype_core::Error::timeout()
                    }
                    StatusCode::BAD_REQUEST => blobtype_core::Error::invalid_input(),
                    _ => blobtype_core::Error::external_error(),
                };
                base.with_message(err.to_string()).with_source(err)
            }
            Error::InvalidKey(e) => blobtype_core::Error::configuration()
                .with_message("account key is not valid base64")
                .with_source(e),
            Error::InvalidHeader(e) => blobtype_core::Error::invalid_input()
                .with_message(e.to_string())
                .with_source(e),
            Error::InvalidUrl(_) => blobtype_core::Error::invalid_input()
                .with_message(err.to_string())
                .with_source(err),
            Error::Date(e) => blobtype_core::Error::unknown()
                .with_message(e.to_string())
                .with_source(e),
        }
    }
}
