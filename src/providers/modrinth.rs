use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::ContentProvider;
use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    ContentQuery, ExtendedProjectMetadata, GalleryImage, Loader, ProjectSummary, ResultPage,
    VersionDependency, VersionDescriptor, VersionFile,
};

const MODRINTH_API_BASE: &str = "https://api.modrinth.com/v2";

/// Primary provider client (labrinth JSON API).
pub struct ModrinthProvider {
    client: reqwest::Client,
    base_url: String,
}

impl ModrinthProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: MODRINTH_API_BASE.to_string(),
        }
    }

    /// Point the client at a different endpoint, used by integration tests.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Facets are a JSON array of AND-ed groups, e.g.
    /// `[["project_type:mod"],["categories:fabric"],["versions:1.21.1"]]`.
    fn facets(query: &ContentQuery) -> Option<String> {
        let mut groups: Vec<Vec<String>> =
            vec![vec![format!("project_type:{}", query.content_type.facet())]];
        if let Some(loader) = query.loader_filter {
            groups.push(vec![format!("categories:{}", loader.as_str())]);
        }
        if let Some(version) = &query.game_version_filter {
            groups.push(vec![format!("versions:{version}")]);
        }
        for category in query.normalized_categories() {
            groups.push(vec![format!("categories:{category}")]);
        }
        serde_json::to_string(&groups).ok()
    }

    fn status_error(url: &str, status: reqwest::StatusCode) -> CatalogError {
        CatalogError::ProviderStatus {
            provider: "Modrinth",
            status: status.as_u16(),
            url: url.to_string(),
        }
    }
}

// ── Wire types ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
    #[serde(default)]
    total_hits: u64,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    project_id: String,
    title: String,
    #[serde(default)]
    description: String,
    icon_url: Option<String>,
    #[serde(default)]
    downloads: u64,
    date_modified: Option<DateTime<Utc>>,
}

impl From<SearchHit> for ProjectSummary {
    fn from(hit: SearchHit) -> Self {
        ProjectSummary {
            id: hit.project_id,
            title: hit.title,
            description: hit.description,
            icon_url: hit.icon_url,
            downloads: hit.downloads,
            last_modified: hit.date_modified,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiVersion {
    id: String,
    name: String,
    version_number: String,
    #[serde(default)]
    game_versions: Vec<String>,
    #[serde(default)]
    loaders: Vec<String>,
    #[serde(default)]
    files: Vec<ApiFile>,
    #[serde(default)]
    dependencies: Vec<ApiDependency>,
    date_published: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    url: String,
    filename: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct ApiDependency {
    project_id: Option<String>,
    version_id: Option<String>,
    dependency_type: String,
}

impl From<ApiVersion> for VersionDescriptor {
    fn from(version: ApiVersion) -> Self {
        VersionDescriptor {
            id: version.id,
            name: version.name,
            version_number: version.version_number,
            game_versions: version.game_versions,
            loaders: version.loaders,
            files: version
                .files
                .into_iter()
                .map(|f| VersionFile {
                    url: f.url,
                    file_name: f.filename,
                    primary: f.primary,
                    size: f.size,
                })
                .collect(),
            dependencies: version
                .dependencies
                .into_iter()
                .map(|d| VersionDependency {
                    project_id: d.project_id,
                    version_id: d.version_id,
                    kind: d.dependency_type,
                })
                .collect(),
            published_at: version.date_published,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiProject {
    #[serde(default)]
    body: String,
    #[serde(default)]
    gallery: Vec<ApiGalleryImage>,
}

#[derive(Debug, Deserialize)]
struct ApiGalleryImage {
    url: String,
    title: Option<String>,
    description: Option<String>,
}

// ── Client ──────────────────────────────────────────────

#[async_trait]
impl ContentProvider for ModrinthProvider {
    async fn search(&self, query: &ContentQuery) -> CatalogResult<ResultPage> {
        let url = format!("{}/search", self.base_url);
        let mut request = self.client.get(&url).query(&[
            ("query", query.text.trim().to_string()),
            ("limit", query.page_size.to_string()),
            ("offset", query.offset().to_string()),
            ("index", query.sort.as_str().to_string()),
        ]);
        if let Some(facets) = Self::facets(query) {
            request = request.query(&[("facets", facets)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(&url, response.status()));
        }

        let body: SearchResponse = response.json().await?;
        debug!(
            "Modrinth search returned {} of {} hits",
            body.hits.len(),
            body.total_hits
        );

        Ok(ResultPage {
            items: body.hits.into_iter().map(ProjectSummary::from).collect(),
            total_count: body.total_hits,
            fetched_at: Utc::now(),
        })
    }

    async fn list_versions(
        &self,
        project_id: &str,
        loader: Option<Loader>,
        game_version: Option<&str>,
    ) -> CatalogResult<Vec<VersionDescriptor>> {
        let url = format!("{}/project/{}/version", self.base_url, project_id);
        let mut request = self.client.get(&url);
        if let Some(loader) = loader {
            if let Ok(filter) = serde_json::to_string(&[loader.as_str()]) {
                request = request.query(&[("loaders", filter)]);
            }
        }
        if let Some(version) = game_version {
            if let Ok(filter) = serde_json::to_string(&[version]) {
                request = request.query(&[("game_versions", filter)]);
            }
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(&url, response.status()));
        }

        let versions: Vec<ApiVersion> = response.json().await?;
        Ok(versions.into_iter().map(VersionDescriptor::from).collect())
    }

    async fn project_details(&self, project_id: &str) -> CatalogResult<ExtendedProjectMetadata> {
        let url = format!("{}/project/{}", self.base_url, project_id);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(&url, response.status()));
        }

        let project: ApiProject = response.json().await?;
        Ok(ExtendedProjectMetadata {
            body: project.body,
            gallery: project
                .gallery
                .into_iter()
                .map(|img| GalleryImage {
                    url: img.url,
                    title: img.title,
                    description: img.description,
                })
                .collect(),
        })
    }
}
