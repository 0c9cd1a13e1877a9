//! Remote content client: a thin, typed abstraction over a tree-structured,
//! version-controlled file store, with optimistic-concurrency writes.
//!
//! The production backend is the GitHub contents API ([`github::GitHubStore`]);
//! the [`RemoteStore`] trait is the seam tests and alternative backends plug
//! into.

pub mod github;
pub mod memory;
pub mod store;
pub mod types;

pub use {
    github::GitHubStore,
    memory::MemoryStore,
    store::RemoteStore,
    types::{DirEntry, DirectoryDelete, EntryKind, FileContent, TreeFile, UpsertOutcome},
};
