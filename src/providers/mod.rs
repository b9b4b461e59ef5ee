// Provider clients. One implementation per external catalog service,
// behind a single trait so the coordinator stays provider-agnostic.

mod curseforge;
mod modrinth;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CatalogResult;
use crate::model::{
    ContentQuery, ExtendedProjectMetadata, Loader, Provider, ResultPage, VersionDescriptor,
};

pub use curseforge::CurseForgeProvider;
pub use modrinth::ModrinthProvider;

/// Contract every content provider fulfills. Must return a stable shape
/// even on zero results.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn search(&self, query: &ContentQuery) -> CatalogResult<ResultPage>;

    async fn list_versions(
        &self,
        project_id: &str,
        loader: Option<Loader>,
        game_version: Option<&str>,
    ) -> CatalogResult<Vec<VersionDescriptor>>;

    async fn project_details(&self, project_id: &str) -> CatalogResult<ExtendedProjectMetadata>;
}

/// The fixed pair of providers the catalog talks to.
#[derive(Clone)]
pub struct ProviderRegistry {
    modrinth: Arc<dyn ContentProvider>,
    curseforge: Arc<dyn ContentProvider>,
}

impl ProviderRegistry {
    pub fn new(modrinth: Arc<dyn ContentProvider>, curseforge: Arc<dyn ContentProvider>) -> Self {
        Self {
            modrinth,
            curseforge,
        }
    }

    pub fn get(&self, provider: Provider) -> &Arc<dyn ContentProvider> {
        match provider {
            Provider::Modrinth => &self.modrinth,
            Provider::CurseForge => &self.curseforge,
        }
    }
}
