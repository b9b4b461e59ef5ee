use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::debug;

/// Best-effort persistence behind the TTL caches.
///
/// Storage is a pure optimization: a failing read is a miss and a failing
/// write is dropped. Implementations must never propagate errors.
pub trait CacheStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, raw: &str);
}

/// One JSON file per key under a cache directory.
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: PathBuf) -> Self {
        let _ = std::fs::create_dir_all(&dir);
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys may carry separators; flatten to a safe file name.
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl CacheStore for DiskStore {
    fn read(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, raw: &str) {
        let path = self.path_for(key);
        if let Err(e) = std::fs::write(&path, raw) {
            debug!("Cache write skipped for {:?}: {}", path, e);
        }
    }
}

/// In-memory store used by tests and as a fallback when no directory is set.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn write(&self, key: &str, raw: &str) {
        self.entries.lock().insert(key.to_string(), raw.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_store_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskStore::new(tmp.path().to_path_buf());

        store.write("query/abc:1", "{\"x\":1}");
        assert_eq!(store.read("query/abc:1").as_deref(), Some("{\"x\":1}"));
        assert_eq!(store.read("missing"), None);
    }

    #[test]
    fn disk_store_survives_unwritable_dir() {
        let store = DiskStore::new(PathBuf::from("/proc/definitely/not/writable"));
        store.write("k", "v");
        assert_eq!(store.read("k"), None);
    }
}
