use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the catalog core.
/// Every module returns `Result<T, CatalogError>`.
#[derive(Debug, Error)]
pub enum CatalogError {
    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned HTTP {status} for {url}")]
    ProviderStatus {
        provider: &'static str,
        status: u16,
        url: String,
    },

    #[error("CurseForge requires an API key (CURSEFORGE_API_KEY)")]
    ApiKeyMissing,

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Collaborators ───────────────────────────────────
    #[error("{0}")]
    Backend(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<std::io::Error> for CatalogError {
    fn from(source: std::io::Error) -> Self {
        CatalogError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl CatalogError {
    /// Whether this failure is the secondary provider's missing-key signal.
    ///
    /// The structured variant is preferred; the message sniff covers errors
    /// relayed as plain text by a backend collaborator.
    pub fn needs_api_key(&self) -> bool {
        match self {
            CatalogError::ApiKeyMissing => true,
            other => {
                let message = other.to_string().to_lowercase();
                message.contains("api key") || message.contains("curseforge_api_key")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_signal_matches_structured_variant() {
        assert!(CatalogError::ApiKeyMissing.needs_api_key());
    }

    #[test]
    fn api_key_signal_matches_relayed_text() {
        let err = CatalogError::Backend("set CURSEFORGE_API_KEY to search".into());
        assert!(err.needs_api_key());
        assert!(!CatalogError::Other("timed out".into()).needs_api_key());
    }
}
