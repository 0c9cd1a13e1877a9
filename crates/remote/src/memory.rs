//! In-memory [`RemoteStore`] with full optimistic-concurrency semantics.
//!
//! Useful for tests and offline development: version tags are content
//! hashes, stale-tag writes fail with `Conflict`, and directory listings are
//! derived from the stored paths (sorted, so iteration is deterministic).

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    sha2::{Digest, Sha256},
    skilldock_common::{Error, Result},
};

use crate::{
    store::RemoteStore,
    types::{
        DirEntry, DirectoryDelete, EntryKind, FileContent, TreeFile, UpsertOutcome, is_binary_path,
    },
};

#[derive(Clone, Default)]
pub struct MemoryStore {
    files: Arc<Mutex<BTreeMap<String, StoredFile>>>,
}

#[derive(Clone)]
struct StoredFile {
    bytes: Vec<u8>,
    tag: String,
}

fn content_tag(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without going through the write path.
    pub fn seed(&self, path: &str, content: &str) {
        let bytes = content.as_bytes().to_vec();
        let tag = content_tag(&bytes);
        self.lock().insert(path.to_string(), StoredFile { bytes, tag });
    }

    /// Raw text content of a file, if present. Test helper.
    #[must_use]
    pub fn text(&self, path: &str) -> Option<String> {
        self.lock()
            .get(path)
            .map(|f| String::from_utf8_lossy(&f.bytes).into_owned())
    }

    /// All stored paths, sorted. Test helper.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredFile>> {
        self.files.lock().expect("memory store lock poisoned")
    }

    fn to_content(path: &str, bytes: &[u8]) -> FileContent {
        if is_binary_path(path) {
            FileContent::Binary(bytes.to_vec())
        } else {
            FileContent::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read_file(&self, path: &str) -> Result<FileContent> {
        let files = self.lock();
        let stored = files.get(path).ok_or_else(|| Error::not_found(path))?;
        Ok(Self::to_content(path, &stored.bytes))
    }

    async fn version_tag(&self, path: &str) -> Result<String> {
        let files = self.lock();
        files
            .get(path)
            .map(|f| f.tag.clone())
            .ok_or_else(|| Error::not_found(path))
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let prefix = format!("{}/", path.trim_matches('/'));
        let files = self.lock();

        let mut entries: BTreeMap<String, DirEntry> = BTreeMap::new();
        for (full_path, stored) in files.range(prefix.clone()..) {
            let Some(rest) = full_path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                // Direct child file.
                None => {
                    entries.insert(rest.to_string(), DirEntry {
                        name: rest.to_string(),
                        path: full_path.clone(),
                        kind: EntryKind::File,
                        tag: Some(stored.tag.clone()),
                        size: stored.bytes.len() as u64,
                    });
                },
                // Deeper file implies a child directory.
                Some((child, _)) => {
                    entries.entry(child.to_string()).or_insert_with(|| DirEntry {
                        name: child.to_string(),
                        path: format!("{prefix}{child}"),
                        kind: EntryKind::Dir,
                        tag: None,
                        size: 0,
                    });
                },
            }
        }

        if entries.is_empty() {
            return Err(Error::not_found(path));
        }
        Ok(entries.into_values().collect())
    }

    async fn read_directory_recursive(&self, path: &str) -> Result<Vec<TreeFile>> {
        let prefix = format!("{}/", path.trim_matches('/'));
        let files = self.lock();

        let collected: Vec<TreeFile> = files
            .range(prefix.clone()..)
            .take_while(|(p, _)| p.starts_with(&prefix))
            .map(|(p, stored)| TreeFile {
                path: p[prefix.len()..].to_string(),
                content: Self::to_content(p, &stored.bytes),
            })
            .collect();

        if collected.is_empty() {
            return Err(Error::not_found(path));
        }
        Ok(collected)
    }

    async fn create_file(
        &self,
        path: &str,
        content: &FileContent,
        _message: &str,
    ) -> Result<String> {
        let mut files = self.lock();
        if files.contains_key(path) {
            return Err(Error::conflict(format!("'{path}' already exists")));
        }
        let bytes = content.as_bytes().to_vec();
        let tag = content_tag(&bytes);
        files.insert(path.to_string(), StoredFile {
            bytes,
            tag: tag.clone(),
        });
        Ok(tag)
    }

    async fn update_file(
        &self,
        path: &str,
        content: &FileContent,
        _message: &str,
        expected_tag: &str,
    ) -> Result<String> {
        let mut files = self.lock();
        let stored = files
            .get_mut(path)
            .ok_or_else(|| Error::not_found(path))?;
        if stored.tag != expected_tag {
            return Err(Error::conflict(format!("version tag mismatch on '{path}'")));
        }
        stored.bytes = content.as_bytes().to_vec();
        stored.tag = content_tag(&stored.bytes);
        Ok(stored.tag.clone())
    }

    async fn upsert_file(
        &self,
        path: &str,
        content: &FileContent,
        _message: &str,
    ) -> Result<UpsertOutcome> {
        let mut files = self.lock();
        let created = !files.contains_key(path);
        let bytes = content.as_bytes().to_vec();
        let tag = content_tag(&bytes);
        files.insert(path.to_string(), StoredFile {
            bytes,
            tag: tag.clone(),
        });
        Ok(UpsertOutcome { tag, created })
    }

    async fn delete_file(&self, path: &str, _message: &str, expected_tag: &str) -> Result<()> {
        let mut files = self.lock();
        let stored = files.get(path).ok_or_else(|| Error::not_found(path))?;
        if stored.tag != expected_tag {
            return Err(Error::conflict(format!("version tag mismatch on '{path}'")));
        }
        files.remove(path);
        Ok(())
    }

    async fn delete_directory(&self, path: &str, _message: &str) -> Result<DirectoryDelete> {
        let prefix = format!("{}/", path.trim_matches('/'));
        let mut files = self.lock();

        let doomed: Vec<String> = files
            .range(prefix.clone()..)
            .take_while(|(p, _)| p.starts_with(&prefix))
            .map(|(p, _)| p.clone())
            .collect();

        let mut report = DirectoryDelete::default();
        for path in doomed {
            files.remove(&path);
            report.deleted.push(path);
        }
        Ok(report)
    }
}
