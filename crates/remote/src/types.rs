use serde::{Deserialize, Serialize};

/// Extensions transferred through the base64-safe channel. Everything else
/// rides the raw text channel.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "bmp", "pdf", "zip", "gz", "tgz", "tar", "bz2",
    "xz", "7z", "woff", "woff2", "ttf", "otf", "eot", "wasm", "so", "dylib", "dll", "bin", "exe",
    "mp3", "mp4", "wav", "ogg", "webm", "sqlite", "db", "pyc", "class", "jar",
];

/// Whether a path should transit the binary (base64) channel, by extension.
#[must_use]
pub fn is_binary_path(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// File payload read from or written to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    #[must_use]
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Text view of the content; `None` for binary payloads.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }
}

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Entry kind in a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry in a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    pub kind: EntryKind,
    /// Opaque content-addressed version tag, when the backend supplies one.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub size: u64,
}

impl DirEntry {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// A file collected by a recursive directory read, path relative to the
/// recursion root.
#[derive(Debug, Clone)]
pub struct TreeFile {
    pub path: String,
    pub content: FileContent,
}

/// Result of a create-or-update write.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// New version tag of the written file.
    pub tag: String,
    /// True when the file did not exist before.
    pub created: bool,
}

/// Outcome of a directory delete. The backend has no atomic directory
/// delete, so leaves are removed one by one; a failure partway through is
/// reported here, not masked, and already-deleted files stay deleted.
#[derive(Debug, Clone, Default)]
pub struct DirectoryDelete {
    pub deleted: Vec<String>,
    /// `(path, reason)` for every leaf that could not be deleted.
    pub failed: Vec<(String, String)>,
}

impl DirectoryDelete {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_detection_by_extension() {
        assert!(is_binary_path("assets/logo.png"));
        assert!(is_binary_path("font.WOFF2"));
        assert!(!is_binary_path("SKILL.md"));
        assert!(!is_binary_path("scripts/helper.py"));
        assert!(!is_binary_path("no-extension"));
    }

    #[test]
    fn text_content_accessors() {
        let text = FileContent::from("hello");
        assert_eq!(text.as_text(), Some("hello"));
        assert!(!text.is_binary());

        let bin = FileContent::Binary(vec![0, 1, 2]);
        assert!(bin.as_text().is_none());
        assert_eq!(bin.as_bytes(), &[0, 1, 2]);
    }
}
