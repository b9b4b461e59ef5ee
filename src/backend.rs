// Collaborator contracts the catalog core consumes. The surrounding
// application implements these; the core never touches files or windows
// directly.

use async_trait::async_trait;

use crate::error::CatalogResult;
use crate::model::{ContentType, EnvironmentSummary, InstalledItem, Loader};

/// Installation backend performing the actual byte-level work.
#[async_trait]
pub trait InstallBackend: Send + Sync {
    /// Install a version into an existing environment. Returns a
    /// human-readable status message.
    async fn install_content(
        &self,
        environment_id: &str,
        version_id: &str,
        loader: Option<Loader>,
        game_version: Option<&str>,
        content_type: ContentType,
    ) -> CatalogResult<String>;

    /// Create a brand-new environment from a modpack version.
    async fn install_into_new_environment(
        &self,
        version_id: &str,
        name: &str,
        icon_url: Option<&str>,
        make_backup: bool,
    ) -> CatalogResult<EnvironmentSummary>;

    /// Install a data pack into a world inside an environment.
    async fn install_data_pack(
        &self,
        environment_id: &str,
        world_id: &str,
        version_id: &str,
    ) -> CatalogResult<String>;

    /// Current content listing of an environment, used to rebuild the
    /// installed-item index.
    async fn list_installed(
        &self,
        environment_id: &str,
        content_type: ContentType,
    ) -> CatalogResult<Vec<InstalledItem>>;

    async fn list_worlds(&self, environment_id: &str) -> CatalogResult<Vec<String>>;

    async fn import_archive_into_world(
        &self,
        environment_id: &str,
        world_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> CatalogResult<String>;

    /// Open an environment folder, or the content-type subfolder when given.
    async fn open_folder(
        &self,
        environment_id: &str,
        content_type: Option<ContentType>,
    ) -> CatalogResult<()>;

    async fn open_world_subfolder(
        &self,
        environment_id: &str,
        world_id: &str,
    ) -> CatalogResult<()>;
}

/// Yes/no prompt shown before destructive operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

/// Host application hooks: confirmation prompts, environment-list refresh
/// and navigation.
#[async_trait]
pub trait CatalogHost: Send + Sync {
    async fn confirm(&self, prompt: ConfirmPrompt) -> bool;

    async fn refresh_environments(&self);

    fn select_environment(&self, environment_id: &str);

    fn go_to_environments(&self);
}
