use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::backend::{CatalogHost, InstallBackend};
use crate::model::ContentType;

/// Auto-dismiss delay for install-originated notifications.
pub const INSTALL_NOTIFICATION_TTL: Duration = Duration::from_millis(5500);
/// Auto-dismiss delay for generic app-level notifications.
pub const APP_NOTIFICATION_TTL: Duration = Duration::from_millis(4500);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Follow-up a notification can carry. Invoking it dismisses the
/// notification first, then performs exactly one of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FollowUpAction {
    OpenContentFolder {
        environment_id: String,
        content_type: ContentType,
    },
    OpenEnvironmentFolder {
        environment_id: String,
    },
    OpenWorldDataPacks {
        environment_id: String,
        world_id: String,
    },
    GoToEnvironments,
}

/// Transient, dismissible notification. At most one is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub action_label: Option<String>,
    pub action: Option<FollowUpAction>,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            action_label: None,
            action: None,
        }
    }

    pub fn with_action(mut self, label: impl Into<String>, action: FollowUpAction) -> Self {
        self.action_label = Some(label.into());
        self.action = Some(action);
        self
    }
}

/// Holds the single active notification and routes its follow-up action,
/// decoupled from the flow that produced it.
#[derive(Clone)]
pub struct NotificationRouter {
    backend: Arc<dyn InstallBackend>,
    host: Arc<dyn CatalogHost>,
    current: Arc<Mutex<Option<Notification>>>,
    /// Bumped on every show/dismiss; an expiry task only clears the
    /// notification it was armed for.
    epoch: Arc<AtomicU64>,
}

impl NotificationRouter {
    pub fn new(backend: Arc<dyn InstallBackend>, host: Arc<dyn CatalogHost>) -> Self {
        Self {
            backend,
            host,
            current: Arc::new(Mutex::new(None)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn current(&self) -> Option<Notification> {
        self.current.lock().clone()
    }

    /// Show a notification, replacing any active one and canceling its
    /// expiry timer.
    pub fn show(&self, notification: Notification, ttl: Duration) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        *self.current.lock() = Some(notification);

        // Arm the expiry timer when a runtime is available; without one the
        // notification simply stays until replaced or dismissed.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let current = Arc::clone(&self.current);
            let epochs = Arc::clone(&self.epoch);
            handle.spawn(async move {
                tokio::time::sleep(ttl).await;
                if epochs.load(Ordering::SeqCst) == epoch {
                    *current.lock() = None;
                }
            });
        }
    }

    /// Show with the install-flow TTL, whatever the severity.
    pub fn notify_install(&self, notification: Notification) {
        self.show(notification, INSTALL_NOTIFICATION_TTL);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(
            Notification::new(message, Severity::Error),
            INSTALL_NOTIFICATION_TTL,
        );
    }

    pub fn dismiss(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.current.lock() = None;
    }

    /// Dismiss the active notification and run its follow-up action.
    /// A failing action becomes a new generic error notification.
    pub async fn invoke_action(&self) {
        let notification = {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            self.current.lock().take()
        };
        let Some(action) = notification.and_then(|n| n.action) else {
            return;
        };

        let result = match &action {
            FollowUpAction::OpenContentFolder {
                environment_id,
                content_type,
            } => {
                self.backend
                    .open_folder(environment_id, Some(*content_type))
                    .await
            }
            FollowUpAction::OpenEnvironmentFolder { environment_id } => {
                self.backend.open_folder(environment_id, None).await
            }
            FollowUpAction::OpenWorldDataPacks {
                environment_id,
                world_id,
            } => {
                self.backend
                    .open_world_subfolder(environment_id, world_id)
                    .await
            }
            FollowUpAction::GoToEnvironments => {
                self.host.go_to_environments();
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Notification action failed: {}", e);
            self.show(
                Notification::new("Could not open the folder.", Severity::Error),
                APP_NOTIFICATION_TTL,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_serializes_with_its_id_and_action() {
        let notification = Notification::new("Install completed.", Severity::Success).with_action(
            "Open folder",
            FollowUpAction::OpenEnvironmentFolder {
                environment_id: "main".to_string(),
            },
        );

        let raw = serde_json::to_string(&notification).unwrap();
        assert!(raw.contains(&notification.id.to_string()));

        let back: Notification = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.id, notification.id);
        assert_eq!(back.action, notification.action);
    }
}
