use std::time::{Duration, Instant};

use {async_trait::async_trait, dashmap::DashMap};

use crate::KvCache;

/// In-process cache store on a concurrent map with lazy expiry.
///
/// Entries are evicted when a reader finds them past their deadline; there is
/// no background sweeper. Deployments that share cache state across processes
/// plug an external KV service in behind [`KvCache`] instead.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries. Test helper.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }
        // Expired: evict outside the read guard.
        self.entries.remove(key);
        None
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn delete_by_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }
}
