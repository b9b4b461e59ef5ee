use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::model::{
    ContentType, EnvironmentSummary, ExtendedProjectMetadata, ProjectSummary, Provider,
    VersionDescriptor,
};
use crate::providers::ProviderRegistry;

/// Current selection: one project, its version list scoped to the active
/// environment, and (for modpacks) the extended metadata.
#[derive(Debug, Clone, Default)]
pub struct SelectionSnapshot {
    pub project: Option<ProjectSummary>,
    pub versions: Vec<VersionDescriptor>,
    pub selected_version_id: Option<String>,
    pub details: Option<ExtendedProjectMetadata>,
    pub gallery_index: usize,
    pub loading: bool,
    pub status: String,
}

impl SelectionSnapshot {
    pub fn selected_version(&self) -> Option<&VersionDescriptor> {
        let id = self.selected_version_id.as_deref()?;
        self.versions.iter().find(|v| v.id == id)
    }

    /// Loaders declared by the selected version, used by install-failure
    /// classification.
    pub fn selected_version_loaders(&self) -> Vec<String> {
        self.selected_version()
            .map(|v| v.loaders.clone())
            .unwrap_or_default()
    }
}

/// Loads versions (and modpack metadata) for the selected project.
pub struct DetailLoader {
    providers: ProviderRegistry,
    state: Mutex<SelectionSnapshot>,
    generation: AtomicU64,
}

impl DetailLoader {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self {
            providers,
            state: Mutex::new(SelectionSnapshot::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.state.lock().clone()
    }

    /// Select a project and load its versions scoped by the current
    /// environment: the loader filter applies to mods only, the game-version
    /// filter to everything except modpacks.
    ///
    /// For modpacks the extended metadata (long description, gallery) loads
    /// in an independent request; its failure leaves `details` empty without
    /// affecting version selection.
    pub async fn select(
        &self,
        provider: Provider,
        content_type: ContentType,
        project: ProjectSummary,
        environment: Option<&EnvironmentSummary>,
    ) -> SelectionSnapshot {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let project_id = project.id.clone();

        {
            let mut state = self.state.lock();
            *state = SelectionSnapshot::default();
            state.project = Some(project);
            state.loading = true;
            state.status = "Loading versions...".to_string();
        }

        let loader_filter = content_type
            .filters_by_loader()
            .then(|| environment.map(|env| env.loader))
            .flatten();
        let game_version_filter = content_type
            .filters_by_game_version()
            .then(|| environment.map(|env| env.game_version()))
            .flatten();

        let client = self.providers.get(provider);

        let versions_task = async {
            let result = client
                .list_versions(&project_id, loader_filter, game_version_filter.as_deref())
                .await;
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!("Discarding stale version list for {}", project_id);
                return;
            }
            let mut state = self.state.lock();
            state.loading = false;
            match result {
                Ok(versions) => {
                    info!("Loaded {} versions for {}", versions.len(), project_id);
                    state.selected_version_id = versions.first().map(|v| v.id.clone());
                    state.versions = versions;
                    state.status.clear();
                }
                Err(e) => {
                    state.versions.clear();
                    state.selected_version_id = None;
                    state.status = format!("Failed to load versions: {e}");
                }
            }
        };

        let details_task = async {
            if content_type != ContentType::Modpack {
                return;
            }
            let details = match client.project_details(&project_id).await {
                Ok(details) => Some(details),
                Err(e) => {
                    debug!("Extended details unavailable for {}: {}", project_id, e);
                    None
                }
            };
            if self.generation.load(Ordering::SeqCst) == generation {
                self.state.lock().details = details;
            }
        };

        tokio::join!(versions_task, details_task);

        self.snapshot()
    }

    /// Pick a version from the loaded list. An id that is not in the list
    /// re-pins the selection to the first version instead.
    pub fn set_selected_version(&self, version_id: &str) {
        let mut state = self.state.lock();
        if state.versions.iter().any(|v| v.id == version_id) {
            state.selected_version_id = Some(version_id.to_string());
        } else {
            state.selected_version_id = state.versions.first().map(|v| v.id.clone());
        }
    }

    /// Drop the selection and everything loaded for it.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.lock() = SelectionSnapshot::default();
    }

    // ── Gallery paging (modpack details) ────────────────

    pub fn gallery_next(&self) {
        self.step_gallery(1);
    }

    pub fn gallery_prev(&self) {
        self.step_gallery(-1);
    }

    pub fn gallery_select(&self, index: usize) {
        let mut state = self.state.lock();
        let count = state.details.as_ref().map(|d| d.gallery.len()).unwrap_or(0);
        if count > 0 {
            state.gallery_index = index % count;
        }
    }

    fn step_gallery(&self, delta: isize) {
        let mut state = self.state.lock();
        let count = state.details.as_ref().map(|d| d.gallery.len()).unwrap_or(0);
        if count == 0 {
            return;
        }
        let count = count as isize;
        let next = (state.gallery_index as isize + delta).rem_euclid(count);
        state.gallery_index = next as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtendedProjectMetadata, GalleryImage};

    fn version(id: &str, loaders: &[&str]) -> VersionDescriptor {
        VersionDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            version_number: "1.0.0".to_string(),
            game_versions: vec!["1.21.1".to_string()],
            loaders: loaders.iter().map(|l| l.to_string()).collect(),
            files: Vec::new(),
            dependencies: Vec::new(),
            published_at: None,
        }
    }

    #[test]
    fn snapshot_resolves_selected_version_loaders() {
        let snapshot = SelectionSnapshot {
            versions: vec![version("a", &["fabric"]), version("b", &["forge"])],
            selected_version_id: Some("b".to_string()),
            ..Default::default()
        };
        assert_eq!(snapshot.selected_version_loaders(), vec!["forge"]);
    }

    #[test]
    fn gallery_wraps_in_both_directions() {
        let mut snapshot = SelectionSnapshot::default();
        snapshot.details = Some(ExtendedProjectMetadata {
            body: String::new(),
            gallery: (0..3)
                .map(|i| GalleryImage {
                    url: format!("img{i}"),
                    title: None,
                    description: None,
                })
                .collect(),
        });

        let loader = DetailLoader::new(crate::providers::ProviderRegistry::new(
            std::sync::Arc::new(NullProvider),
            std::sync::Arc::new(NullProvider),
        ));
        *loader.state.lock() = snapshot;

        loader.gallery_prev();
        assert_eq!(loader.snapshot().gallery_index, 2);
        loader.gallery_next();
        assert_eq!(loader.snapshot().gallery_index, 0);
        loader.gallery_select(7);
        assert_eq!(loader.snapshot().gallery_index, 1);
    }

    struct NullProvider;

    #[async_trait::async_trait]
    impl crate::providers::ContentProvider for NullProvider {
        async fn search(
            &self,
            _query: &crate::model::ContentQuery,
        ) -> crate::error::CatalogResult<crate::model::ResultPage> {
            Ok(crate::model::ResultPage::empty())
        }

        async fn list_versions(
            &self,
            _project_id: &str,
            _loader: Option<crate::model::Loader>,
            _game_version: Option<&str>,
        ) -> crate::error::CatalogResult<Vec<VersionDescriptor>> {
            Ok(Vec::new())
        }

        async fn project_details(
            &self,
            _project_id: &str,
        ) -> crate::error::CatalogResult<ExtendedProjectMetadata> {
            Ok(ExtendedProjectMetadata::default())
        }
    }
}
