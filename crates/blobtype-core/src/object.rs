//! Storage object model.

use serde::{Deserialize, Serialize};

/// Standard HTTP properties stored alongside an object's body.
///
/// Stores such as Azure Blob Storage replace every one of these properties
/// on a property update, so the untouched ones are carried here and resent
/// together with the new content-type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectProperties {
    /// Current content-type, if the store has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    /// Base64-encoded MD5 of the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_md5: Option<String>,
}

impl ObjectProperties {
    /// Creates properties holding only a content-type.
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Default::default()
        }
    }
}

/// A single object yielded by a container listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObject {
    /// Full object name, including any `/`-separated prefix and extension.
    pub name: String,
    /// Properties as last read from the store.
    pub properties: ObjectProperties,
}

impl StorageObject {
    /// Creates an object with the given name and properties.
    pub fn new(name: impl Into<String>, properties: ObjectProperties) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Returns the current content-type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.properties.content_type.as_deref()
    }

    /// Replaces the content-type held locally.
    ///
    /// This does not touch the store; pass the object to
    /// [`ObjectContainer::persist_content_type`](crate::ObjectContainer::persist_content_type)
    /// to apply it.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.properties.content_type = Some(content_type.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_content_type_keeps_other_properties() {
        let mut object = StorageObject::new(
            "photos/cat.jpg",
            ObjectProperties {
                content_type: Some("text/plain".into()),
                cache_control: Some("max-age=3600".into()),
                ..Default::default()
            },
        );

        object.set_content_type("image/jpeg");

        assert_eq!(object.content_type(), Some("image/jpeg"));
        assert_eq!(
            object.properties.cache_control.as_deref(),
            Some("max-age=3600")
        );
    }

    #[test]
    fn test_missing_content_type() {
        let object = StorageObject::new("raw", ObjectProperties::default());
        assert!(object.content_type().is_none());
    }
}
