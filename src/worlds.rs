use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::backend::InstallBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldsPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// World list of the active environment, loaded when the data-pack flow
/// needs a target world.
#[derive(Debug, Clone)]
pub struct WorldsSnapshot {
    pub phase: WorldsPhase,
    pub worlds: Vec<String>,
    pub selected: Option<String>,
    pub error: Option<String>,
}

impl WorldsSnapshot {
    fn idle() -> Self {
        Self {
            phase: WorldsPhase::Idle,
            worlds: Vec::new(),
            selected: None,
            error: None,
        }
    }
}

/// Keeps the world list for the data-pack install/import flows.
pub struct WorldDirectory {
    backend: Arc<dyn InstallBackend>,
    state: Mutex<WorldsSnapshot>,
    generation: AtomicU64,
}

impl WorldDirectory {
    pub fn new(backend: Arc<dyn InstallBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(WorldsSnapshot::idle()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> WorldsSnapshot {
        self.state.lock().clone()
    }

    /// Reload the world list for an environment. The current selection is
    /// kept when the world still exists, otherwise the first world is
    /// selected.
    pub async fn refresh(&self, environment_id: &str) -> WorldsSnapshot {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock();
            state.phase = WorldsPhase::Loading;
            state.error = None;
        }

        let result = self.backend.list_worlds(environment_id).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale world list for {}", environment_id);
            return self.snapshot();
        }

        let mut state = self.state.lock();
        match result {
            Ok(worlds) => {
                state.selected = state
                    .selected
                    .take()
                    .filter(|current| worlds.contains(current))
                    .or_else(|| worlds.first().cloned());
                state.worlds = worlds;
                state.phase = WorldsPhase::Ready;
            }
            Err(e) => {
                warn!("World listing failed for {}: {}", environment_id, e);
                state.worlds.clear();
                state.selected = None;
                state.phase = WorldsPhase::Failed;
                state.error = Some(e.to_string());
            }
        }
        state.clone()
    }

    /// Select a world by id; ids not present in the list are ignored.
    pub fn select_world(&self, world_id: &str) {
        let mut state = self.state.lock();
        if state.worlds.iter().any(|w| w == world_id) {
            state.selected = Some(world_id.to_string());
        }
    }

    /// Forget the list, e.g. when the environment or content tab changes.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.lock() = WorldsSnapshot::idle();
    }
}
