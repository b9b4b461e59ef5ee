use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{CatalogHost, ConfirmPrompt, InstallBackend};
use crate::compat::resolve_compatibility;
use crate::model::{ContentType, InstallRequest, InstalledIndex, Loader};
use crate::notify::{FollowUpAction, Notification, NotificationRouter, Severity};
use crate::worlds::{WorldDirectory, WorldsPhase};

/// Final result of one install attempt. Local validation failures and lock
/// contention never reach the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum InstallOutcome {
    /// Content installed into an existing environment or world.
    Installed { message: String },
    /// A modpack created and selected a new environment.
    EnvironmentCreated { environment_id: String },
    /// Local validation failed; no backend call was made.
    Rejected { reason: String },
    /// The user declined the confirmation prompt.
    Cancelled,
    /// Another install is already in flight; the call was a no-op.
    Busy,
    /// The backend call failed.
    Failed {
        message: String,
        suggested_loader: Option<Loader>,
    },
}

/// Releases the install lock on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Validates per-content-type preconditions, drives the external install
/// operation and folds every outcome into a status line plus an optional
/// notification.
pub struct InstallOrchestrator {
    backend: Arc<dyn InstallBackend>,
    host: Arc<dyn CatalogHost>,
    notifier: NotificationRouter,
    worlds: Arc<WorldDirectory>,
    /// Global install lock: a second call anywhere while one is pending is
    /// refused, never queued.
    busy: AtomicBool,
    importing: AtomicBool,
    status: Mutex<String>,
    installed: Mutex<InstalledIndex>,
}

impl InstallOrchestrator {
    pub fn new(
        backend: Arc<dyn InstallBackend>,
        host: Arc<dyn CatalogHost>,
        notifier: NotificationRouter,
        worlds: Arc<WorldDirectory>,
    ) -> Self {
        Self {
            backend,
            host,
            notifier,
            worlds,
            busy: AtomicBool::new(false),
            importing: AtomicBool::new(false),
            status: Mutex::new(String::new()),
            installed: Mutex::new(InstalledIndex::default()),
        }
    }

    /// Persistent, human-readable result of the last operation. Unlike a
    /// notification it stays until the next operation replaces it.
    pub fn status(&self) -> String {
        self.status.lock().clone()
    }

    pub fn installed_index(&self) -> InstalledIndex {
        self.installed.lock().clone()
    }

    fn set_status(&self, status: impl Into<String>) {
        *self.status.lock() = status.into();
    }

    fn reject(&self, reason: &str) -> InstallOutcome {
        self.set_status(reason);
        InstallOutcome::Rejected {
            reason: reason.to_string(),
        }
    }

    /// Run one install to completion.
    pub async fn install(&self, request: InstallRequest) -> InstallOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Install refused: another install is in flight");
            return InstallOutcome::Busy;
        }
        let _busy = BusyGuard(&self.busy);

        match request.content_type {
            ContentType::DataPack => self.install_data_pack(&request).await,
            ContentType::Modpack => self.install_modpack(&request).await,
            _ => self.install_into_environment(&request).await,
        }
    }

    // ── Data packs ──────────────────────────────────────

    async fn install_data_pack(&self, request: &InstallRequest) -> InstallOutcome {
        let Some(environment) = &request.environment else {
            return self.reject("Select an environment to install data packs.");
        };
        let Some(world_id) = &request.world_id else {
            return self.reject(&self.missing_world_reason("install"));
        };

        self.set_status("Installing data pack...");
        match self
            .backend
            .install_data_pack(&environment.id, world_id, &request.version_id)
            .await
        {
            Ok(message) => {
                info!("Data pack installed into world {}", world_id);
                self.set_status(message.clone());
                self.notifier.notify_install(
                    Notification::new("Data pack installed.", Severity::Success).with_action(
                        "Open folder",
                        FollowUpAction::OpenWorldDataPacks {
                            environment_id: environment.id.clone(),
                            world_id: world_id.clone(),
                        },
                    ),
                );
                InstallOutcome::Installed { message }
            }
            Err(e) => {
                self.set_status(format!("Data pack install failed: {e}"));
                self.notifier.error("Could not install the data pack.");
                InstallOutcome::Failed {
                    message: e.to_string(),
                    suggested_loader: None,
                }
            }
        }
    }

    /// Why no world is currently targetable, in order of likelihood.
    fn missing_world_reason(&self, verb: &str) -> String {
        let worlds = self.worlds.snapshot();
        if worlds.phase == WorldsPhase::Loading {
            "Worlds are still loading.".to_string()
        } else if worlds.worlds.is_empty() {
            "No worlds available. Create one first.".to_string()
        } else {
            format!("Select a world to {verb} the data pack.")
        }
    }

    // ── Modpacks ────────────────────────────────────────

    async fn install_modpack(&self, request: &InstallRequest) -> InstallOutcome {
        let Some(project) = &request.project else {
            return self.reject("Select a modpack first.");
        };

        let confirmed = self
            .host
            .confirm(ConfirmPrompt {
                title: "Install modpack".to_string(),
                message: "Installing a modpack creates a new environment. Making a backup \
                          first is recommended. Continue?"
                    .to_string(),
                confirm_label: "Install".to_string(),
                cancel_label: "Cancel".to_string(),
            })
            .await;
        if !confirmed {
            self.set_status("Installation cancelled.");
            return InstallOutcome::Cancelled;
        }

        self.set_status("Creating the modpack environment...");
        match self
            .backend
            .install_into_new_environment(
                &request.version_id,
                &project.title,
                project.icon_url.as_deref(),
                true,
            )
            .await
        {
            Ok(environment) => {
                info!("Modpack installed into new environment {}", environment.id);
                self.host.refresh_environments().await;
                self.host.select_environment(&environment.id);
                self.set_status(format!(
                    "Modpack installed into environment \"{}\".",
                    environment.name
                ));
                self.notifier.notify_install(
                    Notification::new("Modpack installed.", Severity::Success).with_action(
                        "Open folder",
                        FollowUpAction::OpenEnvironmentFolder {
                            environment_id: environment.id.clone(),
                        },
                    ),
                );
                InstallOutcome::EnvironmentCreated {
                    environment_id: environment.id,
                }
            }
            Err(e) => {
                self.set_status(format!(
                    "Modpack install failed: {e}. Try another version or check your connection."
                ));
                self.notifier.error("Could not install the modpack.");
                InstallOutcome::Failed {
                    message: e.to_string(),
                    suggested_loader: None,
                }
            }
        }
    }

    // ── Mods, resource packs, shaders ───────────────────

    async fn install_into_environment(&self, request: &InstallRequest) -> InstallOutcome {
        let Some(environment) = &request.environment else {
            let reason = if request.content_type == ContentType::Mod {
                "Select a Forge, NeoForge or Fabric environment to install mods."
            } else {
                "Select an environment to install content."
            };
            return self.reject(reason);
        };

        let content_type = request.content_type;
        self.set_status(format!(
            "Installing {}...",
            content_type.label().to_lowercase()
        ));

        let loader_hint = content_type
            .filters_by_loader()
            .then_some(environment.loader);
        let game_version = content_type
            .filters_by_game_version()
            .then(|| environment.game_version());

        match self
            .backend
            .install_content(
                &environment.id,
                &request.version_id,
                loader_hint,
                game_version.as_deref(),
                content_type,
            )
            .await
        {
            Ok(message) => {
                info!("Installed {} into {}", request.version_id, environment.id);
                self.set_status(message.clone());
                // Read back the truth instead of mutating local state.
                self.refresh_installed(&environment.id, content_type).await;

                let mut notification = Notification::new("Install completed.", Severity::Success);
                if content_type.content_dir().is_some() {
                    notification = notification.with_action(
                        "Open folder",
                        FollowUpAction::OpenContentFolder {
                            environment_id: environment.id.clone(),
                            content_type,
                        },
                    );
                }
                self.notifier.notify_install(notification);
                InstallOutcome::Installed { message }
            }
            Err(e) => {
                let compatibility =
                    resolve_compatibility(&request.version_loaders, environment.loader);
                if let (false, Some(suggested)) =
                    (compatibility.compatible, compatibility.suggested)
                {
                    self.set_status(format!(
                        "Not compatible with {}. Switch to a {} environment.",
                        environment.loader.label(),
                        suggested.label()
                    ));
                    self.notifier.notify_install(
                        Notification::new(
                            format!("Switch to a {} environment.", suggested.label()),
                            Severity::Error,
                        )
                        .with_action(
                            format!("Switch to {}", suggested.label()),
                            FollowUpAction::GoToEnvironments,
                        ),
                    );
                    InstallOutcome::Failed {
                        message: e.to_string(),
                        suggested_loader: Some(suggested),
                    }
                } else {
                    self.set_status(format!("Install failed: {e}"));
                    self.notifier.error("Could not install.");
                    InstallOutcome::Failed {
                        message: e.to_string(),
                        suggested_loader: None,
                    }
                }
            }
        }
    }

    // ── Installed-item index ────────────────────────────

    /// Rebuild the installed-item index from the environment's current
    /// content listing. Called after every successful install and whenever
    /// the target environment or content-type tab changes.
    pub async fn refresh_installed(
        &self,
        environment_id: &str,
        content_type: ContentType,
    ) -> InstalledIndex {
        if content_type.content_dir().is_none() {
            *self.installed.lock() = InstalledIndex::default();
            return InstalledIndex::default();
        }

        let index = match self.backend.list_installed(environment_id, content_type).await {
            Ok(items) => InstalledIndex::from_items(&items),
            Err(e) => {
                warn!("Content listing failed for {}: {}", environment_id, e);
                InstalledIndex::default()
            }
        };
        *self.installed.lock() = index.clone();
        index
    }

    // ── Data pack archive import ────────────────────────

    /// Import a local `.zip` archive into the selected world. Shares the
    /// data-pack preconditions but runs under its own guard.
    pub async fn import_datapack_archive(
        &self,
        environment_id: Option<&str>,
        world_id: Option<&str>,
        file_name: &str,
        bytes: &[u8],
    ) -> InstallOutcome {
        if self
            .importing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return InstallOutcome::Busy;
        }
        let _importing = BusyGuard(&self.importing);

        let Some(environment_id) = environment_id else {
            return self.reject("Select an environment to import data packs.");
        };
        let Some(world_id) = world_id else {
            return self.reject(&self.missing_world_reason("import"));
        };
        if !file_name.to_lowercase().ends_with(".zip") {
            return self.reject("Only .zip files are supported.");
        }

        self.set_status("Importing data pack...");
        match self
            .backend
            .import_archive_into_world(environment_id, world_id, file_name, bytes)
            .await
        {
            Ok(message) => {
                self.set_status(message.clone());
                self.notifier.notify_install(
                    Notification::new("Data pack imported.", Severity::Success).with_action(
                        "Open folder",
                        FollowUpAction::OpenWorldDataPacks {
                            environment_id: environment_id.to_string(),
                            world_id: world_id.to_string(),
                        },
                    ),
                );
                InstallOutcome::Installed { message }
            }
            Err(e) => {
                self.set_status(format!("Data pack import failed: {e}"));
                self.notifier.error("Could not import the data pack.");
                InstallOutcome::Failed {
                    message: e.to_string(),
                    suggested_loader: None,
                }
            }
        }
    }
}
