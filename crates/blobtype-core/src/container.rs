//! Storage collaborator trait.

use futures::stream::BoxStream;

use crate::{Result, StorageObject};

/// Lazily produced, forward-only listing of a container's objects.
pub type ObjectStream<'a> = BoxStream<'a, Result<StorageObject>>;

/// A container in a remote object store.
///
/// Implementations provide the two capabilities the update loop needs:
/// enumerating every object and persisting a content-type change for a
/// single object. Pagination, authentication and transport stay behind
/// this trait.
#[async_trait::async_trait]
pub trait ObjectContainer: Send + Sync {
    /// Name of the container, used for logging.
    fn container_name(&self) -> &str;

    /// Streams every object in the container.
    ///
    /// The stream is single-pass. Pages are fetched as the stream is
    /// polled, and an `Err` item means the listing cannot continue.
    fn list_objects(&self) -> ObjectStream<'_>;

    /// Persists `object.properties` (including its content-type) for
    /// `object.name`, leaving the body untouched.
    async fn persist_content_type(&self, object: &StorageObject) -> Result<()>;
}
