//! TTL key/value cache fronting the remote content store.
//!
//! Every read path in skilldock goes through [`cached`] before touching the
//! network; mutation paths invalidate the affected keys afterwards. The cache
//! is best effort: staleness up to the entry's TTL is contractual, failures
//! are never cached, and a miss always re-fetches.

pub mod memory;
pub mod ttl;

use std::time::Duration;

use {
    async_trait::async_trait,
    serde::{Serialize, de::DeserializeOwned},
    skilldock_common::Result,
};

pub use memory::MemoryCache;

/// Key/value store with per-entry TTL. Values are JSON strings; callers
/// serialize through [`cached`] or handle encoding themselves (the token
/// protocol does, so it can rewrite a record in place).
#[async_trait]
pub trait KvCache: Send + Sync {
    /// Fetch a live entry. Expired entries behave as misses.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value for `ttl`.
    async fn put(&self, key: &str, value: String, ttl: Duration);

    /// Drop the exact key, if present.
    async fn delete(&self, key: &str);

    /// Drop every key starting with `prefix`. Used after mutations where the
    /// new version (and therefore the exact version-embedded key) is unknown.
    async fn delete_by_prefix(&self, prefix: &str);
}

/// Read-through helper: return the cached value for `key`, or run `fetch`,
/// store its result for `ttl`, and return it. Fetch errors propagate and
/// leave the cache untouched; there is no negative caching.
pub async fn cached<T, F, Fut>(cache: &dyn KvCache, key: &str, ttl: Duration, fetch: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(raw) = cache.get(key).await {
        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::debug!(key, "cache hit");
                return Ok(value);
            },
            Err(e) => {
                // Stored shape no longer matches; treat as a miss.
                tracing::debug!(key, %e, "cache entry undecodable, refetching");
                cache.delete(key).await;
            },
        }
    }

    let value = fetch().await?;
    let raw = serde_json::to_string(&value)?;
    cache.put(key, raw, ttl).await;
    tracing::debug!(key, ttl_secs = ttl.as_secs(), "cache fill");
    Ok(value)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, skilldock_common::Error};

    #[tokio::test]
    async fn cached_fetches_once_then_serves_from_store() {
        let cache = MemoryCache::new();
        let mut calls = 0u32;

        let first: u32 = cached(&cache, "k", Duration::from_secs(60), || {
            calls += 1;
            async { Ok(41) }
        })
        .await
        .unwrap();
        assert_eq!(first, 41);

        let second: u32 = cached(&cache, "k", Duration::from_secs(60), || {
            calls += 1;
            async { Ok(99) }
        })
        .await
        .unwrap();
        assert_eq!(second, 41);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn fetch_error_is_not_cached() {
        let cache = MemoryCache::new();

        let failed: Result<u32> = cached(&cache, "k", Duration::from_secs(60), || async {
            Err(Error::remote("503"))
        })
        .await;
        assert!(failed.is_err());

        let ok: u32 = cached(&cache, "k", Duration::from_secs(60), || async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(ok, 7);
    }

    #[tokio::test]
    async fn undecodable_entry_is_refetched() {
        let cache = MemoryCache::new();
        cache
            .put("k", "not json at all{".into(), Duration::from_secs(60))
            .await;

        let value: u32 = cached(&cache, "k", Duration::from_secs(60), || async { Ok(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }
}
