use std::collections::HashSet;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info};

use super::{prefetch_key, TtlKeyedCache};
use crate::model::{ContentQuery, ContentType, Loader, Provider, ResultPage};
use crate::providers::ContentProvider;

/// How many warm searches run at once during startup.
const PREFETCH_CONCURRENCY: usize = 4;

/// Populate the warm cache with one coarse entry per loader for mods and
/// modpacks, and one each for resource packs, data packs and shaders.
///
/// Runs once at application startup. Individual failures are skipped; the
/// prefetch is an optimization, never a correctness requirement.
pub async fn warm_start(
    provider: &dyn ContentProvider,
    cache: &TtlKeyedCache<ResultPage>,
    environment_loaders: &[Loader],
    page_size: u32,
) {
    let mut loaders: HashSet<Loader> =
        [Loader::Forge, Loader::NeoForge, Loader::Fabric].into();
    loaders.extend(environment_loaders.iter().filter(|l| l.is_mod_capable()));

    let mut targets: Vec<(ContentType, Option<Loader>)> = vec![
        (ContentType::Modpack, None),
        (ContentType::ResourcePack, None),
        (ContentType::DataPack, None),
        (ContentType::Shader, None),
    ];
    for loader in loaders {
        targets.push((ContentType::Mod, Some(loader)));
        targets.push((ContentType::Modpack, Some(loader)));
    }

    info!("Prefetching {} warm catalog pages", targets.len());

    stream::iter(targets)
        .map(|(content_type, loader)| async move {
            let query = warm_query(content_type, loader, page_size);
            match provider.search(&query).await {
                Ok(page) => {
                    cache.write(&prefetch_key(content_type, loader), page);
                }
                Err(e) => {
                    debug!("Prefetch skipped for {} ({:?}): {}", content_type, loader, e);
                }
            }
        })
        .buffer_unordered(PREFETCH_CONCURRENCY)
        .collect::<Vec<()>>()
        .await;
}

fn warm_query(content_type: ContentType, loader: Option<Loader>, page_size: u32) -> ContentQuery {
    let mut query = ContentQuery::new(Provider::Modrinth, content_type);
    query.page_size = page_size;
    match content_type {
        ContentType::Mod => query.loader_filter = loader,
        // Modpack queries encode the loader as their single category tag.
        ContentType::Modpack => {
            query.categories = loader.map(|l| vec![l.as_str().to_string()]).unwrap_or_default();
        }
        _ => {}
    }
    query
}
