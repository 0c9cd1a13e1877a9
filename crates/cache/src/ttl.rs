//! TTL tiers, graded by how often each resource class changes.

use std::time::Duration;

/// Access policy document. Policy edits take effect within this window.
pub const ACCESS_POLICY: Duration = Duration::from_secs(300);

/// Flattened skill catalog (one listing + N manifest + M declaration
/// reads, registry included). 5 minutes.
pub const CATALOG: Duration = Duration::from_secs(300);

/// Per-package manifest. 1 hour.
pub const MANIFEST: Duration = Duration::from_secs(3600);

/// Per-skill full file tree at a pinned version. The recursive fetch is
/// expensive and the content changes rarely. 6 hours.
pub const FILE_TREE: Duration = Duration::from_secs(21_600);
