use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::backend::{CatalogHost, InstallBackend};
use crate::cache::{
    prefetch, CacheStore, DiskStore, TtlKeyedCache, PREFETCH_TTL, QUERY_CACHE_TTL,
};
use crate::config::CatalogConfig;
use crate::error::CatalogResult;
use crate::http::build_http_client;
use crate::install::InstallOrchestrator;
use crate::model::{Loader, Provider, ResultPage};
use crate::notify::NotificationRouter;
use crate::prefs::FilterPrefs;
use crate::providers::{CurseForgeProvider, ModrinthProvider, ProviderRegistry};
use crate::search::SearchCoordinator;
use crate::selection::DetailLoader;
use crate::worlds::WorldDirectory;

/// Root object wiring every catalog component to one backend and host.
/// Construct once; every field is safe to share across tasks.
pub struct Catalog {
    pub config: CatalogConfig,
    pub search: SearchCoordinator,
    pub details: DetailLoader,
    pub worlds: Arc<WorldDirectory>,
    pub notifications: NotificationRouter,
    pub installer: InstallOrchestrator,
    providers: ProviderRegistry,
    prefetch: Arc<TtlKeyedCache<ResultPage>>,
    store: Arc<dyn CacheStore>,
    prefs: Mutex<FilterPrefs>,
}

impl Catalog {
    /// Wire the catalog with live providers and the on-disk cache.
    pub fn new(
        config: CatalogConfig,
        backend: Arc<dyn InstallBackend>,
        host: Arc<dyn CatalogHost>,
    ) -> CatalogResult<Self> {
        let client = build_http_client()?;
        let providers = ProviderRegistry::new(
            Arc::new(ModrinthProvider::new(client.clone())),
            Arc::new(CurseForgeProvider::new(
                client,
                config.curseforge_api_key.clone(),
            )),
        );
        let store: Arc<dyn CacheStore> = Arc::new(DiskStore::new(config.cache_dir.clone()));
        Ok(Self::assemble(config, providers, store, backend, host))
    }

    /// Wire the catalog against explicit providers and store, used by tests.
    pub fn with_providers(
        config: CatalogConfig,
        providers: ProviderRegistry,
        store: Arc<dyn CacheStore>,
        backend: Arc<dyn InstallBackend>,
        host: Arc<dyn CatalogHost>,
    ) -> Self {
        Self::assemble(config, providers, store, backend, host)
    }

    fn assemble(
        config: CatalogConfig,
        providers: ProviderRegistry,
        store: Arc<dyn CacheStore>,
        backend: Arc<dyn InstallBackend>,
        host: Arc<dyn CatalogHost>,
    ) -> Self {
        let query_cache = Arc::new(TtlKeyedCache::new(QUERY_CACHE_TTL, store.clone()));
        let prefetch = Arc::new(TtlKeyedCache::new(PREFETCH_TTL, store.clone()));
        let worlds = Arc::new(WorldDirectory::new(backend.clone()));
        let notifications = NotificationRouter::new(backend.clone(), host.clone());
        let prefs = Mutex::new(FilterPrefs::load(&store));

        Self {
            search: SearchCoordinator::new(providers.clone(), query_cache, prefetch.clone()),
            details: DetailLoader::new(providers.clone()),
            installer: InstallOrchestrator::new(
                backend,
                host,
                notifications.clone(),
                worlds.clone(),
            ),
            worlds,
            notifications,
            providers,
            prefetch,
            store,
            prefs,
            config,
        }
    }

    /// Warm the prefetch cache against the primary provider. Call once at
    /// startup with the loaders of the user's existing environments.
    pub async fn warm_start(&self, environment_loaders: &[Loader]) {
        info!("Starting catalog warm-up");
        prefetch::warm_start(
            self.providers.get(Provider::Modrinth).as_ref(),
            &self.prefetch,
            environment_loaders,
            self.config.page_size,
        )
        .await;
    }

    // ── Sticky filters ──────────────────────────────────

    pub fn filter_prefs(&self) -> FilterPrefs {
        self.prefs.lock().clone()
    }

    pub fn set_filter_prefs(&self, prefs: FilterPrefs) {
        prefs.save(&self.store);
        *self.prefs.lock() = prefs;
    }
}
