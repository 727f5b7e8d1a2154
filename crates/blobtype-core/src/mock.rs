//! In-memory container for testing.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! blobtype-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use blobtype_core::mock::MemoryContainer;
//!
//! let container = MemoryContainer::new("media")
//!     .with_object("a.jpg", "text/plain")
//!     .with_failing("broken.png");
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::StreamExt;

use crate::{Error, ObjectContainer, ObjectProperties, ObjectStream, Result, StorageObject};

/// Container backed by an ordered in-memory map.
///
/// Listing yields objects in name order. Every persist call is recorded,
/// including the ones configured to fail.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    name: String,
    objects: Mutex<BTreeMap<String, ObjectProperties>>,
    failing: HashSet<String>,
    list_failure_after: Option<usize>,
    persist_calls: Mutex<Vec<String>>,
}

impl MemoryContainer {
    /// Creates an empty container.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds an object with only a content-type set.
    pub fn with_object(self, name: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.with_properties(name, ObjectProperties::with_content_type(content_type))
    }

    /// Adds an object with the given properties.
    pub fn with_properties(self, name: impl Into<String>, properties: ObjectProperties) -> Self {
        lock(&self.objects).insert(name.into(), properties);
        self
    }

    /// Makes every persist call for `name` fail.
    pub fn with_failing(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Makes the listing fail after yielding `count` objects.
    pub fn with_listing_failure_after(mut self, count: usize) -> Self {
        self.list_failure_after = Some(count);
        self
    }

    /// Returns the stored properties of `name`.
    pub fn properties(&self, name: &str) -> Option<ObjectProperties> {
        lock(&self.objects).get(name).cloned()
    }

    /// Returns the stored content-type of `name`.
    pub fn content_type(&self, name: &str) -> Option<String> {
        self.properties(name).and_then(|p| p.content_type)
    }

    /// Names passed to `persist_content_type`, in call order.
    pub fn persist_calls(&self) -> Vec<String> {
        lock(&self.persist_calls).clone()
    }

    /// Forgets recorded persist calls.
    pub fn clear_persist_calls(&self) {
        lock(&self.persist_calls).clear();
    }
}

#[async_trait::async_trait]
impl ObjectContainer for MemoryContainer {
    fn container_name(&self) -> &str {
        &self.name
    }

    fn list_objects(&self) -> ObjectStream<'_> {
        let mut items: Vec<Result<StorageObject>> = lock(&self.objects)
            .iter()
            .map(|(name, properties)| Ok(StorageObject::new(name.clone(), properties.clone())))
            .collect();

        if let Some(count) = self.list_failure_after {
            items.truncate(count);
            items.push(Err(
                Error::network_error().with_message("listing page unavailable")
            ));
        }

        futures::stream::iter(items).boxed()
    }

    async fn persist_content_type(&self, object: &StorageObject) -> Result<()> {
        lock(&self.persist_calls).push(object.name.clone());

        if self.failing.contains(&object.name) {
            return Err(Error::external_error()
                .with_message(format!("injected failure for '{}'", object.name)));
        }

        let mut objects = lock(&self.objects);
        let Some(stored) = objects.get_mut(&object.name) else {
            return Err(Error::not_found().with_message(object.name.clone()));
        };
        *stored = object.properties.clone();
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;

    #[tokio::test]
    async fn test_lists_in_name_order() {
        let container = MemoryContainer::new("media")
            .with_object("b.png", "image/png")
            .with_object("a.jpg", "text/plain");

        let names: Vec<_> = container
            .list_objects()
            .map_ok(|o| o.name)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(names, ["a.jpg", "b.png"]);
    }

    #[tokio::test]
    async fn test_persist_updates_store() {
        let container = MemoryContainer::new("media").with_object("a.jpg", "text/plain");

        let mut object = StorageObject::new("a.jpg", container.properties("a.jpg").unwrap());
        object.set_content_type("image/jpeg");
        container.persist_content_type(&object).await.unwrap();

        assert_eq!(
            container.content_type("a.jpg").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(container.persist_calls(), ["a.jpg"]);
    }

    #[tokio::test]
    async fn test_persist_failure_is_injected() {
        let container = MemoryContainer::new("media")
            .with_object("a.jpg", "text/plain")
            .with_failing("a.jpg");

        let object = StorageObject::new("a.jpg", ObjectProperties::with_content_type("image/jpeg"));
        let err = container.persist_content_type(&object).await.unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::ExternalError);
        assert_eq!(
            container.content_type("a.jpg").as_deref(),
            Some("text/plain")
        );
    }

    #[tokio::test]
    async fn test_listing_failure() {
        let container = MemoryContainer::new("media")
            .with_object("a.jpg", "text/plain")
            .with_object("b.jpg", "text/plain")
            .with_listing_failure_after(1);

        let items: Vec<_> = container.list_objects().collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }
}
