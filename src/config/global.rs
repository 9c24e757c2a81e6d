//! Process-wide configuration snapshot for boundary code that has nowhere to
//! thread a config through. Components themselves take a `FileboostConfig`.
//!
//! Readers receive an `Arc` snapshot that never changes under them; writers
//! swap in a whole new config.

use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

use super::FileboostConfig;

static CONFIG: LazyLock<ArcSwap<FileboostConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(FileboostConfig::from_env()));

/// The current snapshot, built from the environment on first access.
pub fn current() -> Arc<FileboostConfig> {
    CONFIG.load_full()
}

/// Applies `update` to a copy of the current config and publishes it.
pub fn configure(update: impl FnOnce(&mut FileboostConfig)) -> Arc<FileboostConfig> {
    let mut next = FileboostConfig::clone(&CONFIG.load());
    update(&mut next);
    let next = Arc::new(next);
    CONFIG.store(Arc::clone(&next));
    tracing::debug!(config = ?next, "Fileboost configuration updated.");
    next
}

pub fn replace(config: FileboostConfig) {
    CONFIG.store(Arc::new(config));
}

/// Rebuilds the snapshot from the environment. Meant for test harnesses.
pub fn reset() {
    replace(FileboostConfig::from_env());
}
