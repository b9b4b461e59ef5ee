use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::ContentProvider;
use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    ContentQuery, ExtendedProjectMetadata, Loader, ProjectSummary, ResultPage, VersionDescriptor,
    VersionFile,
};

const CURSEFORGE_API_BASE: &str = "https://api.curseforge.com/v1";
const MINECRAFT_GAME_ID: u32 = 432;

/// Secondary provider client. Every call requires an API key; without one
/// the client fails locally before touching the network.
pub struct CurseForgeProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl CurseForgeProvider {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: CURSEFORGE_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(
        client: reqwest::Client,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into(),
        }
    }

    fn api_key(&self) -> CatalogResult<&str> {
        self.api_key.as_deref().ok_or(CatalogError::ApiKeyMissing)
    }

    fn status_error(url: &str, status: reqwest::StatusCode) -> CatalogError {
        CatalogError::ProviderStatus {
            provider: "CurseForge",
            status: status.as_u16(),
            url: url.to_string(),
        }
    }

    /// CurseForge's file listings mix loader names into `gameVersions`.
    fn split_file_tags(tags: &[String]) -> (Vec<String>, Vec<String>) {
        let mut loaders = Vec::new();
        let mut versions = Vec::new();
        for tag in tags {
            match Loader::parse(tag) {
                Some(loader) => loaders.push(loader.as_str().to_string()),
                None => versions.push(tag.clone()),
            }
        }
        (loaders, versions)
    }

    fn mod_loader_type(loader: Loader) -> Option<u8> {
        match loader {
            Loader::Forge => Some(1),
            Loader::Fabric => Some(4),
            Loader::Quilt => Some(5),
            Loader::NeoForge => Some(6),
            Loader::Vanilla => None,
        }
    }
}

// ── Wire types ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<CfMod>,
    pagination: Option<CfPagination>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CfPagination {
    #[serde(default)]
    total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CfMod {
    id: u64,
    name: String,
    #[serde(default)]
    summary: String,
    logo: Option<CfLogo>,
    #[serde(default)]
    download_count: f64,
    date_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CfLogo {
    thumbnail_url: Option<String>,
}

impl From<CfMod> for ProjectSummary {
    fn from(item: CfMod) -> Self {
        ProjectSummary {
            id: item.id.to_string(),
            title: item.name,
            description: item.summary,
            icon_url: item.logo.and_then(|l| l.thumbnail_url),
            downloads: item.download_count.max(0.0) as u64,
            last_modified: item.date_modified,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    data: Vec<CfFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CfFile {
    id: u64,
    display_name: String,
    file_name: String,
    download_url: Option<String>,
    #[serde(default)]
    file_length: u64,
    #[serde(default)]
    game_versions: Vec<String>,
    file_date: Option<DateTime<Utc>>,
}

impl From<CfFile> for VersionDescriptor {
    fn from(file: CfFile) -> Self {
        let (loaders, game_versions) = CurseForgeProvider::split_file_tags(&file.game_versions);
        let file_name = file.file_name.clone();
        VersionDescriptor {
            id: file.id.to_string(),
            name: file.display_name,
            version_number: file_name.clone(),
            game_versions,
            loaders,
            files: file
                .download_url
                .map(|url| {
                    vec![VersionFile {
                        url,
                        file_name,
                        primary: true,
                        size: file.file_length,
                    }]
                })
                .unwrap_or_default(),
            dependencies: Vec::new(),
            published_at: file.file_date,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DescriptionResponse {
    #[serde(default)]
    data: String,
}

// ── Client ──────────────────────────────────────────────

#[async_trait]
impl ContentProvider for CurseForgeProvider {
    async fn search(&self, query: &ContentQuery) -> CatalogResult<ResultPage> {
        let key = self.api_key()?;
        let url = format!("{}/mods/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-api-key", key)
            .query(&[
                ("gameId", MINECRAFT_GAME_ID.to_string()),
                ("searchFilter", query.text.trim().to_string()),
                ("pageSize", query.page_size.to_string()),
                ("index", query.offset().to_string()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(&url, response.status()));
        }

        let body: SearchResponse = response.json().await?;
        debug!("CurseForge search returned {} mods", body.data.len());

        Ok(ResultPage {
            total_count: body
                .pagination
                .map(|p| p.total_count)
                .unwrap_or(body.data.len() as u64),
            items: body.data.into_iter().map(ProjectSummary::from).collect(),
            fetched_at: Utc::now(),
        })
    }

    async fn list_versions(
        &self,
        project_id: &str,
        loader: Option<Loader>,
        game_version: Option<&str>,
    ) -> CatalogResult<Vec<VersionDescriptor>> {
        let key = self.api_key()?;
        let url = format!("{}/mods/{}/files", self.base_url, project_id);
        let mut request = self.client.get(&url).header("x-api-key", key);
        if let Some(version) = game_version {
            request = request.query(&[("gameVersion", version)]);
        }
        if let Some(kind) = loader.and_then(Self::mod_loader_type) {
            request = request.query(&[("modLoaderType", kind.to_string())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(&url, response.status()));
        }

        let body: FilesResponse = response.json().await?;
        Ok(body.data.into_iter().map(VersionDescriptor::from).collect())
    }

    async fn project_details(&self, project_id: &str) -> CatalogResult<ExtendedProjectMetadata> {
        let key = self.api_key()?;
        let url = format!("{}/mods/{}/description", self.base_url, project_id);
        let response = self.client.get(&url).header("x-api-key", key).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(&url, response.status()));
        }

        let body: DescriptionResponse = response.json().await?;
        Ok(ExtendedProjectMetadata {
            body: body.data,
            gallery: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentType, Provider};

    #[tokio::test]
    async fn missing_api_key_fails_locally() {
        let provider = CurseForgeProvider::new(reqwest::Client::new(), None);
        let query = ContentQuery::new(Provider::CurseForge, ContentType::Mod);

        let err = provider.search(&query).await.unwrap_err();
        assert!(matches!(err, CatalogError::ApiKeyMissing));
        assert!(err.needs_api_key());
    }

    #[test]
    fn file_tags_split_into_loaders_and_versions() {
        let tags = vec![
            "1.21.1".to_string(),
            "Fabric".to_string(),
            "Quilt".to_string(),
            "1.21".to_string(),
        ];
        let (loaders, versions) = CurseForgeProvider::split_file_tags(&tags);
        assert_eq!(loaders, vec!["fabric", "quilt"]);
        assert_eq!(versions, vec!["1.21.1", "1.21"]);
    }

    #[test]
    fn deserialize_search_mod() {
        let json = r#"{
            "id": 238222,
            "name": "Just Enough Items",
            "summary": "View items and recipes",
            "logo": { "thumbnailUrl": "https://media.forgecdn.net/jei.png" },
            "downloadCount": 321000000.0,
            "dateModified": "2024-10-01T00:00:00Z"
        }"#;
        let item: CfMod = serde_json::from_str(json).unwrap();
        let summary = ProjectSummary::from(item);
        assert_eq!(summary.id, "238222");
        assert_eq!(summary.downloads, 321_000_000);
    }
}
