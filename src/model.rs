use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External content source exposing search/version/metadata endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Modrinth,
    CurseForge,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Modrinth => write!(f, "Modrinth"),
            Provider::CurseForge => write!(f, "CurseForge"),
        }
    }
}

/// Category of installable item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Mod,
    ResourcePack,
    DataPack,
    Shader,
    Modpack,
}

impl ContentType {
    pub fn all() -> [ContentType; 5] {
        [
            ContentType::Mod,
            ContentType::ResourcePack,
            ContentType::DataPack,
            ContentType::Shader,
            ContentType::Modpack,
        ]
    }

    /// Search facet value understood by the providers.
    pub fn facet(&self) -> &'static str {
        match self {
            ContentType::Mod => "mod",
            ContentType::ResourcePack => "resourcepack",
            ContentType::DataPack => "datapack",
            ContentType::Shader => "shader",
            ContentType::Modpack => "modpack",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Mod => "Mods",
            ContentType::ResourcePack => "Resource Packs",
            ContentType::DataPack => "Data Packs",
            ContentType::Shader => "Shaders",
            ContentType::Modpack => "Modpacks",
        }
    }

    /// Folder inside an environment where this kind of content lands.
    /// Data packs live under a world and modpacks become environments,
    /// so neither maps to a content folder.
    pub fn content_dir(&self) -> Option<&'static str> {
        match self {
            ContentType::Mod => Some("mods"),
            ContentType::ResourcePack => Some("resourcepacks"),
            ContentType::Shader => Some("shaderpacks"),
            ContentType::DataPack | ContentType::Modpack => None,
        }
    }

    /// Modpacks create a brand-new environment instead of installing
    /// into an existing one.
    pub fn requires_environment(&self) -> bool {
        !matches!(self, ContentType::Modpack)
    }

    /// Only mods are searched and installed per loader family.
    pub fn filters_by_loader(&self) -> bool {
        matches!(self, ContentType::Mod)
    }

    /// Modpacks intentionally span multiple game versions.
    pub fn filters_by_game_version(&self) -> bool {
        !matches!(self, ContentType::Modpack)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.facet())
    }
}

/// Sort order accepted by the search endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Relevance,
    Downloads,
    Newest,
    Updated,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::Downloads => "downloads",
            SortKey::Newest => "newest",
            SortKey::Updated => "updated",
        }
    }
}

/// Supported mod loaders — strongly typed, no magic strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Fabric,
    Forge,
    NeoForge,
    Quilt,
    Vanilla,
}

impl Loader {
    /// Parse a loader tag as the providers spell it.
    pub fn parse(value: &str) -> Option<Loader> {
        match value.trim().to_lowercase().as_str() {
            "fabric" => Some(Loader::Fabric),
            "forge" => Some(Loader::Forge),
            "neoforge" => Some(Loader::NeoForge),
            "quilt" | "quilt-loader" => Some(Loader::Quilt),
            "vanilla" => Some(Loader::Vanilla),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Loader::Fabric => "fabric",
            Loader::Forge => "forge",
            Loader::NeoForge => "neoforge",
            Loader::Quilt => "quilt",
            Loader::Vanilla => "vanilla",
        }
    }

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Loader::Fabric => "Fabric",
            Loader::Forge => "Forge",
            Loader::NeoForge => "NeoForge",
            Loader::Quilt => "Quilt",
            Loader::Vanilla => "Vanilla",
        }
    }

    /// Loaders that can host mods from the catalog.
    pub fn is_mod_capable(&self) -> bool {
        matches!(self, Loader::Fabric | Loader::Forge | Loader::NeoForge)
    }
}

impl std::fmt::Display for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable parameters of one user-initiated search.
///
/// A new query instance is built before each fetch; the coordinator never
/// mutates one in place. For the modpack content type, `categories` carries
/// a single loader tag instead of free categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentQuery {
    pub provider: Provider,
    pub content_type: ContentType,
    pub text: String,
    pub loader_filter: Option<Loader>,
    pub game_version_filter: Option<String>,
    pub sort: SortKey,
    pub categories: Vec<String>,
    pub page: u32,
    pub page_size: u32,
}

impl ContentQuery {
    pub fn new(provider: Provider, content_type: ContentType) -> Self {
        Self {
            provider,
            content_type,
            text: String::new(),
            loader_filter: None,
            game_version_filter: None,
            sort: SortKey::Downloads,
            categories: Vec::new(),
            page: 0,
            page_size: 24,
        }
    }

    pub fn offset(&self) -> u32 {
        self.page * self.page_size
    }

    /// Category set with duplicates removed and a stable order,
    /// so equivalent queries hash identically.
    pub fn normalized_categories(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Loader tag encoded in the category set of a modpack query.
    pub fn modpack_loader(&self) -> Option<Loader> {
        if self.content_type != ContentType::Modpack {
            return None;
        }
        match self.categories.as_slice() {
            [single] => Loader::parse(single),
            _ => None,
        }
    }
}

/// Provider-agnostic projection of one search hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon_url: Option<String>,
    pub downloads: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of search results, replaced wholesale on each new query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultPage {
    pub items: Vec<ProjectSummary>,
    pub total_count: u64,
    pub fetched_at: DateTime<Utc>,
}

impl ResultPage {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            fetched_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionFile {
    pub url: String,
    pub file_name: String,
    pub primary: bool,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionDependency {
    pub project_id: Option<String>,
    pub version_id: Option<String>,
    pub kind: String,
}

/// One installable version of a project, loaded lazily on selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionDescriptor {
    pub id: String,
    pub name: String,
    pub version_number: String,
    pub game_versions: Vec<String>,
    pub loaders: Vec<String>,
    pub files: Vec<VersionFile>,
    pub dependencies: Vec<VersionDependency>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryImage {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Long-form project metadata, fetched only for modpacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtendedProjectMetadata {
    pub body: String,
    pub gallery: Vec<GalleryImage>,
}

/// One entry of an environment's current content listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstalledItem {
    pub file_name: String,
    pub project_id: Option<String>,
    pub version_id: Option<String>,
    pub enabled: bool,
}

/// Derived view over the target environment's content listing.
///
/// Rebuilt from `list_installed` after every successful install and whenever
/// the target environment or the content-type tab changes; never mutated
/// optimistically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstalledIndex {
    projects: HashSet<String>,
    versions: HashSet<String>,
    disabled_projects: HashSet<String>,
}

impl InstalledIndex {
    pub fn from_items(items: &[InstalledItem]) -> Self {
        let mut index = InstalledIndex::default();
        for item in items {
            if let Some(project_id) = &item.project_id {
                index.projects.insert(project_id.clone());
                if !item.enabled {
                    index.disabled_projects.insert(project_id.clone());
                }
            }
            if let Some(version_id) = &item.version_id {
                index.versions.insert(version_id.clone());
            }
        }
        index
    }

    pub fn is_project_installed(&self, project_id: &str) -> bool {
        self.projects.contains(project_id)
    }

    pub fn is_version_installed(&self, version_id: &str) -> bool {
        self.versions.contains(version_id)
    }

    pub fn is_project_disabled(&self, project_id: &str) -> bool {
        self.disabled_projects.contains(project_id)
    }

    /// Label for the install button of a given project/version pair.
    pub fn install_label(
        &self,
        content_type: ContentType,
        project_id: Option<&str>,
        version_id: Option<&str>,
    ) -> String {
        let noun = match content_type {
            ContentType::DataPack => "data pack".to_string(),
            other => other.label().to_lowercase(),
        };
        if version_id.is_some_and(|id| self.is_version_installed(id)) {
            return "Installed".to_string();
        }
        if project_id.is_some_and(|id| self.is_project_installed(id)) {
            return format!("Update {noun}");
        }
        format!("Install {noun}")
    }
}

/// Summary of a local environment (fixed loader + game version).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentSummary {
    pub id: String,
    pub name: String,
    pub loader: Loader,
    /// Composite version id as stored by the launcher,
    /// e.g. "1.20.1-forge-47.2.0" or "fabric-loader-0.16.10-1.21.1".
    pub version: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl EnvironmentSummary {
    pub fn game_version(&self) -> String {
        extract_game_version(&self.version)
    }

    /// Environments created by a modpack install are never install targets.
    pub fn is_modpack(&self) -> bool {
        self.tags.iter().any(|t| t == "modpack")
    }
}

/// Environments a given content type can be installed into.
pub fn eligible_environments<'a>(
    environments: &'a [EnvironmentSummary],
    content_type: ContentType,
) -> Vec<&'a EnvironmentSummary> {
    environments
        .iter()
        .filter(|env| !env.is_modpack())
        .filter(|env| content_type != ContentType::Mod || env.loader.is_mod_capable())
        .collect()
}

/// Derive the plain game version from a composite version id.
pub fn extract_game_version(version_id: &str) -> String {
    if let Some((game, _)) = version_id.split_once("-forge-") {
        if !game.is_empty() {
            return game.to_string();
        }
    }
    if let Some((game, _)) = version_id.split_once("-neoforge-") {
        if !game.is_empty() {
            return game.to_string();
        }
    }
    if let Some(rest) = version_id.strip_prefix("neoforge-") {
        // NeoForge versions encode the game version as "<minor>.<patch>.<build>".
        let token = rest.split('-').next().unwrap_or_default();
        let mut parts = token.split('.');
        let minor: u32 = parts.next().unwrap_or("0").parse().unwrap_or(0);
        let patch: u32 = parts.next().unwrap_or("0").parse().unwrap_or(0);
        if minor > 0 {
            return if patch > 0 {
                format!("1.{minor}.{patch}")
            } else {
                format!("1.{minor}")
            };
        }
    }
    if version_id.starts_with("fabric-loader-") {
        if let Some(last) = version_id.split('-').next_back() {
            if !last.is_empty() {
                return last.to_string();
            }
        }
    }
    version_id
        .split('-')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(version_id)
        .to_string()
}

/// Parameters of one install operation. Exactly one is in flight at a time.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub content_type: ContentType,
    pub provider: Provider,
    pub project: Option<ProjectSummary>,
    pub version_id: String,
    pub environment: Option<EnvironmentSummary>,
    pub world_id: Option<String>,
    /// Loaders declared by the selected version, used to classify failures.
    pub version_loaders: Vec<String>,
}

impl InstallRequest {
    pub fn creates_new_environment(&self) -> bool {
        self.content_type == ContentType::Modpack
    }
}
