use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{prefetch_key, query_key, TtlKeyedCache};
use crate::model::{ContentQuery, ContentType, Loader, Provider, ResultPage};
use crate::providers::ProviderRegistry;

/// Lifecycle of the active query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Loading,
    Success,
    Error,
    /// The secondary provider does not support unfiltered listing;
    /// an empty-text query short-circuits here without a network call.
    NeedsQuery,
}

/// Point-in-time view of the coordinator, safe to hand to a renderer.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    pub phase: SearchPhase,
    pub page: Option<ResultPage>,
    pub status: String,
    pub needs_api_key: bool,
    pub page_index: u32,
    pub page_size: u32,
}

impl SearchSnapshot {
    pub fn has_next_page(&self) -> bool {
        self.page
            .as_ref()
            .map(|p| has_next_page(self.page_index, self.page_size, p.total_count))
            .unwrap_or(false)
    }
}

/// `total_count` from the last successful page governs pagination.
pub fn has_next_page(page: u32, page_size: u32, total_count: u64) -> bool {
    (u64::from(page) + 1) * u64::from(page_size) < total_count
}

struct SearchState {
    phase: SearchPhase,
    page: Option<ResultPage>,
    status: String,
    needs_api_key: bool,
    page_index: u32,
    page_size: u32,
}

impl SearchState {
    fn new() -> Self {
        Self {
            phase: SearchPhase::Idle,
            page: None,
            status: String::new(),
            needs_api_key: false,
            page_index: 0,
            page_size: 24,
        }
    }
}

/// Owns query dispatch: paints cache hits instantly, revalidates with a
/// live fetch, and discards results of superseded queries.
///
/// There is no cancellation of the underlying network call; each dispatch
/// takes a generation ticket and a completed fetch applies only while its
/// ticket is still the active one.
pub struct SearchCoordinator {
    providers: ProviderRegistry,
    query_cache: Arc<TtlKeyedCache<ResultPage>>,
    prefetch: Arc<TtlKeyedCache<ResultPage>>,
    state: Mutex<SearchState>,
    next_generation: AtomicU64,
    active_generation: AtomicU64,
    in_flight: Mutex<Option<(String, u64)>>,
}

impl SearchCoordinator {
    pub fn new(
        providers: ProviderRegistry,
        query_cache: Arc<TtlKeyedCache<ResultPage>>,
        prefetch: Arc<TtlKeyedCache<ResultPage>>,
    ) -> Self {
        Self {
            providers,
            query_cache,
            prefetch,
            state: Mutex::new(SearchState::new()),
            next_generation: AtomicU64::new(0),
            active_generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let state = self.state.lock();
        SearchSnapshot {
            phase: state.phase,
            page: state.page.clone(),
            status: state.status.clone(),
            needs_api_key: state.needs_api_key,
            page_index: state.page_index,
            page_size: state.page_size,
        }
    }

    /// Run one query to completion: every filter, provider, content-type,
    /// page or sort change builds a new query and goes through here.
    ///
    /// Returns the coordinator state as of this dispatch finishing, which
    /// may already reflect a newer query.
    pub async fn dispatch(&self, query: ContentQuery) -> SearchSnapshot {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.active_generation.store(generation, Ordering::SeqCst);

        {
            let mut state = self.state.lock();
            state.phase = SearchPhase::Loading;
            state.needs_api_key = false;
            state.page_index = query.page;
            state.page_size = query.page_size;
            state.status = searching_status(&query);
        }

        // CurseForge cannot list without a search term.
        if query.provider == Provider::CurseForge && query.text.trim().is_empty() {
            {
                let mut state = self.state.lock();
                state.phase = SearchPhase::NeedsQuery;
                state.page = None;
                state.status = "Type to search on CurseForge.".to_string();
            }
            return self.snapshot();
        }

        let key = query_key(&query);

        // Paint a cached page immediately; the live fetch below revalidates.
        if let Some(cached) = self.query_cache.read(&key) {
            debug!("Query cache hit, painting before revalidation");
            self.state.lock().page = Some(cached);
        } else if let Some(prefetch_key) = prefetch_lookup(&query) {
            if let Some(warm) = self.prefetch.read(&prefetch_key) {
                debug!("Prefetch hit for {}", prefetch_key);
                self.state.lock().page = Some(warm);
            }
        }

        // Skip the revalidation when the very same query is already in
        // flight; adopt its ticket so its result still applies.
        {
            let mut in_flight = self.in_flight.lock();
            match in_flight.as_ref() {
                Some((pending_key, pending_generation)) if *pending_key == key => {
                    // Adopt the pending ticket only while this dispatch still
                    // owns the display; a newer dispatch keeps its own.
                    let _ = self.active_generation.compare_exchange(
                        generation,
                        *pending_generation,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    );
                    return self.snapshot();
                }
                _ => *in_flight = Some((key.clone(), generation)),
            }
        }

        let result = self.providers.get(query.provider).search(&query).await;

        {
            let mut in_flight = self.in_flight.lock();
            if matches!(in_flight.as_ref(), Some((_, g)) if *g == generation) {
                *in_flight = None;
            }
        }

        // A newer dispatch owns the display now; this result is stale.
        if self.active_generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale result for superseded query");
            return self.snapshot();
        }

        match result {
            Ok(page) => {
                info!(
                    "Search succeeded: {} items of {}",
                    page.items.len(),
                    page.total_count
                );
                self.query_cache.write(&key, page.clone());
                let mut state = self.state.lock();
                state.phase = SearchPhase::Success;
                state.page = Some(page);
                state.status.clear();
            }
            Err(e) => {
                let mut state = self.state.lock();
                state.phase = SearchPhase::Error;
                if query.provider == Provider::CurseForge && e.needs_api_key() {
                    state.needs_api_key = true;
                    state.status =
                        "CurseForge requires an API key (CURSEFORGE_API_KEY).".to_string();
                } else {
                    state.status = format!("Search failed: {e}");
                }
            }
        }

        self.snapshot()
    }
}

fn searching_status(query: &ContentQuery) -> String {
    match query.provider {
        Provider::CurseForge => "Searching CurseForge...".to_string(),
        Provider::Modrinth => {
            let noun = query.content_type.label().to_lowercase();
            if query.text.trim().is_empty() {
                format!("Loading popular {noun}...")
            } else {
                format!("Searching {noun} on Modrinth...")
            }
        }
    }
}

/// Warm-cache key for a query, or `None` when the prefetch namespace does
/// not apply (non-empty text, a later page, or the secondary provider).
fn prefetch_lookup(query: &ContentQuery) -> Option<String> {
    if query.provider != Provider::Modrinth || !query.text.trim().is_empty() || query.page != 0 {
        return None;
    }
    let key = match query.content_type {
        // The warm mods entry exists per loader; fall back to the NeoForge
        // entry when no environment constrains the search.
        ContentType::Mod => prefetch_key(
            ContentType::Mod,
            Some(query.loader_filter.unwrap_or(Loader::NeoForge)),
        ),
        ContentType::Modpack => prefetch_key(ContentType::Modpack, query.modpack_loader()),
        other => prefetch_key(other, None),
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_window() {
        // totalCount = 50, pageSize = 24: pages 0 and 1 have a next page,
        // page 2 does not.
        assert!(has_next_page(0, 24, 50));
        assert!(has_next_page(1, 24, 50));
        assert!(!has_next_page(2, 24, 50));
        assert!(!has_next_page(0, 24, 0));
    }

    #[test]
    fn prefetch_lookup_applies_only_to_empty_first_pages() {
        let mut query = ContentQuery::new(Provider::Modrinth, ContentType::Shader);
        assert_eq!(
            prefetch_lookup(&query).as_deref(),
            Some("prefetch_shader_any")
        );

        query.text = "bsl".into();
        assert_eq!(prefetch_lookup(&query), None);

        query.text.clear();
        query.page = 1;
        assert_eq!(prefetch_lookup(&query), None);
    }

    #[test]
    fn prefetch_lookup_keys_mods_by_loader() {
        let mut query = ContentQuery::new(Provider::Modrinth, ContentType::Mod);
        query.loader_filter = Some(Loader::Fabric);
        assert_eq!(
            prefetch_lookup(&query).as_deref(),
            Some("prefetch_mod_fabric")
        );

        query.loader_filter = None;
        assert_eq!(
            prefetch_lookup(&query).as_deref(),
            Some("prefetch_mod_neoforge")
        );
    }
}
