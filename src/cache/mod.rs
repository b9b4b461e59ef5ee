// Two-tier result cache: a short-TTL per-query cache keyed by a digest of
// the normalized query, plus a longer-lived warm prefetch cache keyed by
// coarse parameters. Both are instances of `TtlKeyedCache`.

mod store;

pub mod prefetch;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::{ContentQuery, ContentType, Loader};

pub use store::{CacheStore, DiskStore, MemoryStore};

/// TTL of the per-query result cache.
pub const QUERY_CACHE_TTL: Duration = Duration::from_secs(15 * 60);
/// TTL of the startup prefetch cache.
pub const PREFETCH_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope<V> {
    written_at: DateTime<Utc>,
    payload: V,
}

/// TTL-bounded keyed cache with an in-memory map in front of a best-effort
/// persistent store. An entry older than the TTL is treated as absent.
pub struct TtlKeyedCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Envelope<V>>>,
    store: Arc<dyn CacheStore>,
}

impl<V> TtlKeyedCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    pub fn new(ttl: Duration, store: Arc<dyn CacheStore>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            store,
        }
    }

    pub fn read(&self, key: &str) -> Option<V> {
        self.read_at(key, Utc::now())
    }

    /// Read with an explicit clock, used by the TTL tests.
    pub fn read_at(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        if let Some(envelope) = self.entries.lock().get(key) {
            if self.is_fresh(envelope.written_at, now) {
                return Some(envelope.payload.clone());
            }
            return None;
        }

        let raw = self.store.read(key)?;
        let envelope: Envelope<V> = serde_json::from_str(&raw).ok()?;
        if !self.is_fresh(envelope.written_at, now) {
            return None;
        }
        let payload = envelope.payload.clone();
        self.entries.lock().insert(key.to_string(), envelope);
        Some(payload)
    }

    pub fn write(&self, key: &str, value: V) {
        self.write_at(key, value, Utc::now());
    }

    pub fn write_at(&self, key: &str, value: V, now: DateTime<Utc>) {
        let envelope = Envelope {
            written_at: now,
            payload: value,
        };
        if let Ok(raw) = serde_json::to_string(&envelope) {
            self.store.write(key, &raw);
        }
        self.entries.lock().insert(key.to_string(), envelope);
    }

    fn is_fresh(&self, written_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = now
            .signed_duration_since(written_at)
            .to_std()
            .unwrap_or_default();
        age <= self.ttl
    }
}

/// Deterministic cache key over every query field that affects results.
/// The category set is normalized first, so order never changes the key.
pub fn query_key(query: &ContentQuery) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.provider.to_string().to_lowercase());
    hasher.update(b"\n");
    hasher.update(query.content_type.facet());
    hasher.update(b"\n");
    hasher.update(query.text.trim());
    hasher.update(b"\n");
    hasher.update(query.offset().to_string());
    hasher.update(b"\n");
    hasher.update(query.page_size.to_string());
    hasher.update(b"\n");
    hasher.update(query.sort.as_str());
    hasher.update(b"\n");
    hasher.update(query.loader_filter.map(|l| l.as_str()).unwrap_or(""));
    hasher.update(b"\n");
    hasher.update(query.game_version_filter.as_deref().unwrap_or(""));
    hasher.update(b"\n");
    hasher.update(query.normalized_categories().join(","));
    format!("query_{}", hex::encode(hasher.finalize()))
}

/// Coarse key for the prefetch namespace, e.g. "prefetch_mod_fabric".
pub fn prefetch_key(content_type: ContentType, loader: Option<Loader>) -> String {
    let loader = loader.map(|l| l.as_str()).unwrap_or("any");
    format!("prefetch_{}_{}", content_type.facet(), loader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Provider, ResultPage, SortKey};
    use chrono::Duration as ChronoDuration;

    fn query() -> ContentQuery {
        let mut q = ContentQuery::new(Provider::Modrinth, ContentType::Mod);
        q.text = "sodium".into();
        q.loader_filter = Some(Loader::Fabric);
        q.game_version_filter = Some("1.21.1".into());
        q.sort = SortKey::Downloads;
        q.categories = vec!["utility".into(), "optimization".into()];
        q
    }

    #[test]
    fn query_key_is_deterministic_and_order_insensitive() {
        let a = query();
        let mut b = query();
        b.categories = vec!["optimization".into(), "utility".into()];

        assert_eq!(query_key(&a), query_key(&a));
        assert_eq!(query_key(&a), query_key(&b));
    }

    #[test]
    fn query_key_changes_with_result_affecting_fields() {
        let base = query();

        let mut paged = query();
        paged.page = 1;
        assert_ne!(query_key(&base), query_key(&paged));

        let mut other_sort = query();
        other_sort.sort = SortKey::Newest;
        assert_ne!(query_key(&base), query_key(&other_sort));

        let mut other_provider = query();
        other_provider.provider = Provider::CurseForge;
        assert_ne!(query_key(&base), query_key(&other_provider));
    }

    #[test]
    fn cache_read_back_within_ttl_and_absent_after_expiry() {
        let cache: TtlKeyedCache<ResultPage> =
            TtlKeyedCache::new(QUERY_CACHE_TTL, Arc::new(MemoryStore::new()));
        let page = ResultPage::empty();
        let written = Utc::now();

        cache.write_at("k", page.clone(), written);
        assert_eq!(
            cache.read_at("k", written + ChronoDuration::minutes(14)),
            Some(page)
        );
        assert_eq!(cache.read_at("k", written + ChronoDuration::minutes(16)), None);
    }

    #[test]
    fn expired_persisted_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        let writer: TtlKeyedCache<ResultPage> =
            TtlKeyedCache::new(QUERY_CACHE_TTL, store.clone());
        let written = Utc::now() - ChronoDuration::hours(1);
        writer.write_at("k", ResultPage::empty(), written);

        // A fresh cache instance sees only the persisted copy.
        let reader: TtlKeyedCache<ResultPage> = TtlKeyedCache::new(QUERY_CACHE_TTL, store);
        assert_eq!(reader.read("k"), None);
    }

    #[test]
    fn persisted_entry_survives_process_restart() {
        let store = Arc::new(MemoryStore::new());
        let writer: TtlKeyedCache<ResultPage> =
            TtlKeyedCache::new(QUERY_CACHE_TTL, store.clone());
        writer.write("k", ResultPage::empty());

        let reader: TtlKeyedCache<ResultPage> = TtlKeyedCache::new(QUERY_CACHE_TTL, store);
        assert!(reader.read("k").is_some());
    }

    #[test]
    fn corrupt_persisted_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store.write("k", "not json");
        let cache: TtlKeyedCache<ResultPage> = TtlKeyedCache::new(QUERY_CACHE_TTL, store);
        assert_eq!(cache.read("k"), None);
    }
}
