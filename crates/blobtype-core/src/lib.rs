#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the update loop.
pub const TRACING_TARGET_RESET: &str = "blobtype_core::reset";

mod container;
mod error;
mod object;
mod resolve;

pub mod reset;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

#[doc(hidden)]
pub mod prelude;

pub use container::{ObjectContainer, ObjectStream};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use object::{ObjectProperties, StorageObject};
pub use reset::{ContentTypeReset, Decision, UpdateOutcome, UpdateSummary, decide};
pub use resolve::ExtensionTable;
