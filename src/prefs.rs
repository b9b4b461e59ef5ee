use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheStore;
use crate::model::Loader;

/// Storage key; bump the suffix when the shape changes incompatibly.
const FILTER_PREFS_KEY: &str = "catalog_filters_v1";

/// Sticky catalog filters restored across sessions. Persistence is
/// best-effort: anything malformed falls back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPrefs {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub modpack_loader: Option<Loader>,
}

impl FilterPrefs {
    pub fn load(store: &Arc<dyn CacheStore>) -> Self {
        let Some(raw) = store.read(FILTER_PREFS_KEY) else {
            return Self::default();
        };
        let mut prefs: Self = match serde_json::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(e) => {
                debug!("Discarding malformed filter prefs: {}", e);
                return Self::default();
            }
        };
        // Only loaders a modpack can actually target survive the load.
        if matches!(
            prefs.modpack_loader,
            Some(Loader::Quilt) | Some(Loader::Vanilla)
        ) {
            prefs.modpack_loader = None;
        }
        prefs
    }

    pub fn save(&self, store: &Arc<dyn CacheStore>) {
        match serde_json::to_string(self) {
            Ok(raw) => store.write(FILTER_PREFS_KEY, &raw),
            Err(e) => debug!("Filter prefs not saved: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    fn store() -> Arc<dyn CacheStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn round_trips_through_the_store() {
        let store = store();
        let prefs = FilterPrefs {
            categories: vec!["adventure".into(), "optimization".into()],
            modpack_loader: Some(Loader::Fabric),
        };
        prefs.save(&store);
        assert_eq!(FilterPrefs::load(&store), prefs);
    }

    #[test]
    fn malformed_payload_falls_back_to_defaults() {
        let store = store();
        store.write(FILTER_PREFS_KEY, "not json at all");
        assert_eq!(FilterPrefs::load(&store), FilterPrefs::default());
    }

    #[test]
    fn rejects_loaders_modpacks_cannot_target() {
        let store = store();
        store.write(
            FILTER_PREFS_KEY,
            r#"{"categories":[],"modpack_loader":"quilt"}"#,
        );
        assert_eq!(FilterPrefs::load(&store).modpack_loader, None);
    }
}
