//! Convenience re-exports.

pub use crate::container::{ObjectContainer, ObjectStream};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::object::{ObjectProperties, StorageObject};
pub use crate::reset::{ContentTypeReset, UpdateOutcome, UpdateSummary};
pub use crate::resolve::ExtensionTable;
