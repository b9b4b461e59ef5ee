// Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use launcher_catalog::backend::{CatalogHost, ConfirmPrompt, InstallBackend};
use launcher_catalog::error::{CatalogError, CatalogResult};
use launcher_catalog::model::{
    ContentQuery, ContentType, EnvironmentSummary, ExtendedProjectMetadata, InstalledItem, Loader,
    ProjectSummary, ResultPage, VersionDescriptor,
};
use launcher_catalog::providers::ContentProvider;

// ── Fixtures ────────────────────────────────────────────

pub fn page(titles: &[&str], total_count: u64) -> ResultPage {
    ResultPage {
        items: titles
            .iter()
            .map(|title| ProjectSummary {
                id: title.to_lowercase(),
                title: title.to_string(),
                description: String::new(),
                icon_url: None,
                downloads: 0,
                last_modified: None,
            })
            .collect(),
        total_count,
        fetched_at: Utc::now(),
    }
}

pub fn environment(id: &str, loader: Loader, version: &str) -> EnvironmentSummary {
    EnvironmentSummary {
        id: id.to_string(),
        name: id.to_string(),
        loader,
        version: version.to_string(),
        tags: Vec::new(),
    }
}

pub fn project(title: &str) -> ProjectSummary {
    ProjectSummary {
        id: title.to_lowercase(),
        title: title.to_string(),
        description: String::new(),
        icon_url: None,
        downloads: 0,
        last_modified: None,
    }
}

// ── Scripted provider ───────────────────────────────────

/// Provider answering `search` from a script keyed by query text, with an
/// optional per-key delay so tests can interleave slow and fast queries.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<HashMap<String, ResultPage>>,
    delays: Mutex<HashMap<String, Duration>>,
    versions: Mutex<HashMap<String, Vec<VersionDescriptor>>>,
    pub search_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, text: &str, page: ResultPage) {
        self.responses.lock().insert(text.to_string(), page);
    }

    pub fn respond_after(&self, text: &str, delay: Duration, page: ResultPage) {
        self.delays.lock().insert(text.to_string(), delay);
        self.respond(text, page);
    }

    pub fn versions_for(&self, project_id: &str, versions: Vec<VersionDescriptor>) {
        self.versions.lock().insert(project_id.to_string(), versions);
    }
}

#[async_trait]
impl ContentProvider for ScriptedProvider {
    async fn search(&self, query: &ContentQuery) -> CatalogResult<ResultPage> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().get(&query.text).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .get(&query.text)
            .cloned()
            .ok_or_else(|| CatalogError::Other(format!("no script for {:?}", query.text)))
    }

    async fn list_versions(
        &self,
        project_id: &str,
        _loader: Option<Loader>,
        _game_version: Option<&str>,
    ) -> CatalogResult<Vec<VersionDescriptor>> {
        Ok(self
            .versions
            .lock()
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn project_details(&self, _project_id: &str) -> CatalogResult<ExtendedProjectMetadata> {
        Ok(ExtendedProjectMetadata::default())
    }
}

// ── Recording backend ───────────────────────────────────

/// Backend recording every call it receives. Each operation succeeds unless
/// a failure is armed.
pub struct RecordingBackend {
    pub calls: Mutex<Vec<String>>,
    pub install_delay: Mutex<Option<Duration>>,
    pub worlds_delay: Mutex<Option<Duration>>,
    pub fail_installs: AtomicBool,
    pub fail_folder_open: AtomicBool,
    pub worlds: Mutex<Vec<String>>,
    pub installed: Mutex<Vec<InstalledItem>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            install_delay: Mutex::new(None),
            worlds_delay: Mutex::new(None),
            fail_installs: AtomicBool::new(false),
            fail_folder_open: AtomicBool::new(false),
            worlds: Mutex::new(Vec::new()),
            installed: Mutex::new(Vec::new()),
        }
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_named(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == name).count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().push(name.to_string());
    }

    fn install_result(&self, message: &str) -> CatalogResult<String> {
        if self.fail_installs.load(Ordering::SeqCst) {
            Err(CatalogError::Backend("download failed".into()))
        } else {
            Ok(message.to_string())
        }
    }
}

#[async_trait]
impl InstallBackend for RecordingBackend {
    async fn install_content(
        &self,
        _environment_id: &str,
        _version_id: &str,
        _loader: Option<Loader>,
        _game_version: Option<&str>,
        _content_type: ContentType,
    ) -> CatalogResult<String> {
        self.record("install_content");
        let delay = *self.install_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.install_result("Installed.")
    }

    async fn install_into_new_environment(
        &self,
        _version_id: &str,
        name: &str,
        _icon_url: Option<&str>,
        _make_backup: bool,
    ) -> CatalogResult<EnvironmentSummary> {
        self.record("install_into_new_environment");
        if self.fail_installs.load(Ordering::SeqCst) {
            return Err(CatalogError::Backend("download failed".into()));
        }
        Ok(environment(name, Loader::Fabric, "fabric-loader-0.16.10-1.21.1"))
    }

    async fn install_data_pack(
        &self,
        _environment_id: &str,
        _world_id: &str,
        _version_id: &str,
    ) -> CatalogResult<String> {
        self.record("install_data_pack");
        self.install_result("Data pack installed.")
    }

    async fn list_installed(
        &self,
        _environment_id: &str,
        _content_type: ContentType,
    ) -> CatalogResult<Vec<InstalledItem>> {
        self.record("list_installed");
        Ok(self.installed.lock().clone())
    }

    async fn list_worlds(&self, _environment_id: &str) -> CatalogResult<Vec<String>> {
        self.record("list_worlds");
        let delay = *self.worlds_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.worlds.lock().clone())
    }

    async fn import_archive_into_world(
        &self,
        _environment_id: &str,
        _world_id: &str,
        _file_name: &str,
        _bytes: &[u8],
    ) -> CatalogResult<String> {
        self.record("import_archive_into_world");
        self.install_result("Data pack imported.")
    }

    async fn open_folder(
        &self,
        _environment_id: &str,
        _content_type: Option<ContentType>,
    ) -> CatalogResult<()> {
        self.record("open_folder");
        if self.fail_folder_open.load(Ordering::SeqCst) {
            Err(CatalogError::Backend("no such folder".into()))
        } else {
            Ok(())
        }
    }

    async fn open_world_subfolder(
        &self,
        _environment_id: &str,
        _world_id: &str,
    ) -> CatalogResult<()> {
        self.record("open_world_subfolder");
        Ok(())
    }
}

// ── Recording host ──────────────────────────────────────

pub struct RecordingHost {
    pub confirm_answer: AtomicBool,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            confirm_answer: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CatalogHost for RecordingHost {
    async fn confirm(&self, _prompt: ConfirmPrompt) -> bool {
        self.calls.lock().push("confirm".to_string());
        self.confirm_answer.load(Ordering::SeqCst)
    }

    async fn refresh_environments(&self) {
        self.calls.lock().push("refresh_environments".to_string());
    }

    fn select_environment(&self, environment_id: &str) {
        self.calls
            .lock()
            .push(format!("select_environment:{environment_id}"));
    }

    fn go_to_environments(&self) {
        self.calls.lock().push("go_to_environments".to_string());
    }
}
