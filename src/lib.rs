// Catalog core for the launcher: content discovery across Modrinth and
// CurseForge, version inspection, loader-compatibility classification and
// install orchestration. The surrounding application supplies an
// `InstallBackend` and a `CatalogHost`; everything else lives here.

pub mod backend;
pub mod cache;
pub mod catalog;
pub mod compat;
pub mod config;
pub mod error;
pub mod http;
pub mod install;
pub mod model;
pub mod notify;
pub mod prefs;
pub mod providers;
pub mod search;
pub mod selection;
pub mod worlds;

use tracing_subscriber::EnvFilter;

pub use catalog::Catalog;
pub use compat::{resolve_compatibility, Compatibility};
pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult};
pub use install::InstallOutcome;
pub use model::{
    ContentQuery, ContentType, EnvironmentSummary, InstallRequest, Loader, Provider, ResultPage,
    SortKey,
};

/// Initialize structured logging. Call once from the host application.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,launcher_catalog=debug")),
        )
        .init();
}
