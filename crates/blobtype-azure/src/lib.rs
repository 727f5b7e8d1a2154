//! Azure Blob Storage client for blobtype.
//!
//! This crate provides [`AzureBlobClient`], the [`ObjectContainer`]
//! implementation used by the `blobtype` binary. Requests are signed with the
//! storage account's Shared Key; listing follows List Blobs continuation
//! markers lazily, and content-type changes are written with Set Blob
//! Properties so blob bodies are never re-uploaded.
//!
//! # Example
//!
//! ```rust,ignore
//! use blobtype_azure::{AzureBlobClient, AzureConfig};
//! use blobtype_core::ContentTypeReset;
//!
//! let config = AzureConfig::new("myaccount", account_key, "media");
//! let client = AzureBlobClient::connect(&config).await?;
//!
//! let summary = ContentTypeReset::default().run(&client, |_, _| {}).await?;
//! ```
//!
//! [`ObjectContainer`]: blobtype_core::ObjectContainer

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod auth;
mod client;
mod config;
mod error;
mod list;

pub use crate::client::{API_VERSION, AzureBlobClient, TRACING_TARGET};
pub use crate::config::{AzureConfig, DEFAULT_TIMEOUT, MAX_PAGE_SIZE};
pub use crate::error::{Error, Result};
