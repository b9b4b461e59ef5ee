use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_PAGE_SIZE: u32 = 24;

/// Runtime configuration, loaded once at startup. A missing or malformed
/// config file yields the defaults; the CurseForge key additionally falls
/// back to the `CURSEFORGE_API_KEY` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub curseforge_api_key: Option<String>,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            curseforge_api_key: None,
            cache_dir: default_cache_dir(),
            page_size: default_page_size(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("launcher-catalog")
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl CatalogConfig {
    /// Load from the platform config directory, then apply environment
    /// overrides. Never fails.
    pub fn load() -> Self {
        let mut config = Self::from_disk().unwrap_or_default();
        if config.curseforge_api_key.is_none() {
            config.curseforge_api_key = std::env::var("CURSEFORGE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        info!(
            "Config loaded (cache dir {:?}, CurseForge key {})",
            config.cache_dir,
            if config.curseforge_api_key.is_some() {
                "set"
            } else {
                "unset"
            }
        );
        config
    }

    fn from_disk() -> Option<Self> {
        let path = dirs::config_dir()?.join("launcher-catalog").join("config.json");
        let raw = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(config) => Some(config),
            Err(e) => {
                debug!("Ignoring malformed config at {:?}: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: CatalogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.curseforge_api_key.is_none());
        assert!(config.cache_dir.ends_with("launcher-catalog"));
    }

    #[test]
    fn explicit_fields_win_over_defaults() {
        let config: CatalogConfig = serde_json::from_str(
            r#"{"curseforge_api_key":"k","cache_dir":"/tmp/cc","page_size":48}"#,
        )
        .unwrap();
        assert_eq!(config.curseforge_api_key.as_deref(), Some("k"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cc"));
        assert_eq!(config.page_size, 48);
    }
}
