//! Extension to content-type resolution.
//!
//! [`ExtensionTable`] maps a normalized file extension (lower-case, with a
//! leading dot) to a canonical MIME type. The built-in table is created on
//! first use and never changes afterwards. Lookups for unmapped extensions
//! return `None`; there is no fallback type.

use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Built-in extension mappings. Values are canonical lower-case MIME types.
const BUILTIN_ENTRIES: &[(&str, &str)] = &[
    // Images
    (".apng", "image/apng"),
    (".avif", "image/avif"),
    (".bmp", "image/bmp"),
    (".gif", "image/gif"),
    (".heic", "image/heic"),
    (".ico", "image/vnd.microsoft.icon"),
    (".jpe", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".jpg", "image/jpeg"),
    (".png", "image/png"),
    (".svg", "image/svg+xml"),
    (".tif", "image/tiff"),
    (".tiff", "image/tiff"),
    (".webp", "image/webp"),
    // Web assets
    (".css", "text/css"),
    (".htm", "text/html"),
    (".html", "text/html"),
    (".js", "text/javascript"),
    (".json", "application/json"),
    (".map", "application/json"),
    (".mjs", "text/javascript"),
    (".wasm", "application/wasm"),
    (".webmanifest", "application/manifest+json"),
    (".xml", "application/xml"),
    // Text
    (".csv", "text/csv"),
    (".md", "text/markdown"),
    (".txt", "text/plain"),
    (".yaml", "application/yaml"),
    (".yml", "application/yaml"),
    // Documents
    (".doc", "application/msword"),
    (
        ".docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (".epub", "application/epub+zip"),
    (".pdf", "application/pdf"),
    (".ppt", "application/vnd.ms-powerpoint"),
    (
        ".pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    (".rtf", "application/rtf"),
    (".xls", "application/vnd.ms-excel"),
    (
        ".xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    // Archives
    (".7z", "application/x-7z-compressed"),
    (".gz", "application/gzip"),
    (".tar", "application/x-tar"),
    (".zip", "application/zip"),
    // Audio
    (".aac", "audio/aac"),
    (".flac", "audio/flac"),
    (".m4a", "audio/mp4"),
    (".mp3", "audio/mpeg"),
    (".oga", "audio/ogg"),
    (".wav", "audio/wav"),
    // Video
    (".avi", "video/x-msvideo"),
    (".m4v", "video/mp4"),
    (".mov", "video/quicktime"),
    (".mp4", "video/mp4"),
    (".ogv", "video/ogg"),
    (".webm", "video/webm"),
    // Fonts
    (".otf", "font/otf"),
    (".ttf", "font/ttf"),
    (".woff", "font/woff"),
    (".woff2", "font/woff2"),
];

static BUILTIN: LazyLock<ExtensionTable> =
    LazyLock::new(|| ExtensionTable::from_entries(BUILTIN_ENTRIES));

/// Immutable, ordered mapping from normalized extension to MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTable {
    entries: BTreeMap<&'static str, &'static str>,
}

impl ExtensionTable {
    /// Returns the built-in table.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    fn from_entries(entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
        }
    }

    /// Resolves the MIME type implied by `name`'s extension.
    ///
    /// Returns `None` when the name has no extension or the extension is
    /// not in the table.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&'static str> {
        let extension = Self::extension(name)?;
        self.entries.get(extension.as_str()).copied()
    }

    /// Extracts the normalized extension of `name`: the text after the last
    /// `.` of the final path segment, lower-cased, with a leading dot.
    ///
    /// ```
    /// use blobtype_core::ExtensionTable;
    ///
    /// assert_eq!(ExtensionTable::extension("img/Cat.JPG").as_deref(), Some(".jpg"));
    /// assert_eq!(ExtensionTable::extension("v1.2/README"), None);
    /// ```
    #[must_use]
    pub fn extension(name: &str) -> Option<String> {
        let file_name = name.rsplit_once('/').map_or(name, |(_, file)| file);
        let (_, extension) = file_name.rsplit_once('.')?;
        if extension.is_empty() {
            return None;
        }

        Some(format!(".{}", extension.to_ascii_lowercase()))
    }

    /// Number of mapped extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no mappings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
