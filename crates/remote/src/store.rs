use {async_trait::async_trait, skilldock_common::Result};

use crate::types::{DirEntry, DirectoryDelete, FileContent, TreeFile, UpsertOutcome};

/// Contract over the version-controlled remote file store.
///
/// Writes take the current version tag of the target (obtained by a metadata
/// read immediately beforehand); a stale tag must surface as
/// `Error::Conflict`, never a silent overwrite. Read-path callers treat
/// `Error::NotFound` on optional sub-resources as "absent".
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read a single file. Binary-by-extension files come back as
    /// [`FileContent::Binary`], everything else as text.
    async fn read_file(&self, path: &str) -> Result<FileContent>;

    /// Cheap existence probe.
    async fn file_exists(&self, path: &str) -> Result<bool> {
        match self.version_tag(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Current version tag of a file, without its content.
    async fn version_tag(&self, path: &str) -> Result<String>;

    /// List the immediate entries of a directory.
    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Depth-first recursive read of a directory into a flat list of files
    /// with paths relative to `path`. Sibling subtrees may be fetched
    /// concurrently; ordering of the result is not significant.
    async fn read_directory_recursive(&self, path: &str) -> Result<Vec<TreeFile>>;

    /// Create a new file. Fails with `Conflict` if it already exists.
    async fn create_file(&self, path: &str, content: &FileContent, message: &str)
    -> Result<String>;

    /// Update an existing file, guarded by its current version tag.
    async fn update_file(
        &self,
        path: &str,
        content: &FileContent,
        message: &str,
        expected_tag: &str,
    ) -> Result<String>;

    /// Create-or-update: read the current tag, then write with it.
    async fn upsert_file(
        &self,
        path: &str,
        content: &FileContent,
        message: &str,
    ) -> Result<UpsertOutcome>;

    /// Delete a single file, guarded by its current version tag.
    async fn delete_file(&self, path: &str, message: &str, expected_tag: &str) -> Result<()>;

    /// Delete every file under a directory, leaf by leaf. Partial failure is
    /// reported in the returned value, never masked.
    async fn delete_directory(&self, path: &str, message: &str) -> Result<DirectoryDelete>;
}
