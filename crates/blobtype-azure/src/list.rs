//! List Blobs and error response bodies.

use blobtype_core::{ObjectProperties, StorageObject};
use serde::Deserialize;

use crate::error::Result;

/// One page of a flat blob listing.
#[derive(Debug, Default)]
pub(crate) struct ListPage {
    pub objects: Vec<StorageObject>,
    /// Continuation token, `None` on the last page.
    pub next_marker: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnumerationResults {
    #[serde(default)]
    blobs: Blobs,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Blobs {
    #[serde(rename = "Blob", default)]
    items: Vec<BlobItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BlobItem {
    name: String,
    #[serde(default)]
    properties: BlobProperties,
}

#[derive(Debug, Default, Deserialize)]
struct BlobProperties {
    #[serde(rename = "Content-Type", default)]
    content_type: Option<String>,
    #[serde(rename = "Content-Encoding", default)]
    content_encoding: Option<String>,
    #[serde(rename = "Content-Language", default)]
    content_language: Option<String>,
    #[serde(rename = "Content-Disposition", default)]
    content_disposition: Option<String>,
    #[serde(rename = "Cache-Control", default)]
    cache_control: Option<String>,
    #[serde(rename = "Content-MD5", default)]
    content_md5: Option<String>,
}

impl From<BlobItem> for StorageObject {
    fn from(item: BlobItem) -> Self {
        let p = item.properties;
        StorageObject::new(
            item.name,
            ObjectProperties {
                content_type: non_empty(p.content_type),
                content_encoding: non_empty(p.content_encoding),
                content_language: non_empty(p.content_language),
                content_disposition: non_empty(p.content_disposition),
                cache_control: non_empty(p.cache_control),
                content_md5: non_empty(p.content_md5),
            },
        )
    }
}

/// Parses a List Blobs response body.
pub(crate) fn parse_list_page(body: &str) -> Result<ListPage> {
    let body = body.trim_start_matches('\u{feff}');
    let results: EnumerationResults = quick_xml::de::from_str(body)?;
    Ok(ListPage {
        objects: results
            .blobs
            .items
            .into_iter()
            .map(StorageObject::from)
            .collect(),
        next_marker: non_empty(results.next_marker),
    })
}

/// Storage service error body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parses an error body, tolerating empty or non-XML bodies.
    pub fn parse(body: &str) -> Self {
        let body = body.trim_start_matches('\u{feff}');
        let parsed: Self = quick_xml::de::from_str(body).unwrap_or_default();
        Self {
            code: non_empty(parsed.code),
            message: non_empty(parsed.message.map(|m| first_line(&m))),
        }
    }
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or_default().trim().to_owned()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
