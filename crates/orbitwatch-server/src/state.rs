//! Shared application state.

use std::sync::Arc;

use orbitwatch_core::OrbitWatchConfig;
use orbitwatch_propagate::Propagator;
use orbitwatch_runtime::{
    GroupLimit, QueryService, RefreshOrchestrator, SnapshotCell, SourceFetcher,
};
use orbitwatch_store::CatalogStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: OrbitWatchConfig,
    pub store: Arc<CatalogStore>,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub query: QueryService,
}

impl AppState {
    pub fn new(
        config: OrbitWatchConfig,
        store: CatalogStore,
        propagator: Arc<dyn Propagator>,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Self {
        let store = Arc::new(store);
        let snapshots = Arc::new(SnapshotCell::new());

        let orchestrator = Arc::new(RefreshOrchestrator::new(
            store.clone(),
            propagator.clone(),
            fetcher,
            snapshots.clone(),
            config.groups.clone(),
            config.cadence,
        ));
        let query = QueryService::new(snapshots, propagator);

        Self {
            config,
            store,
            orchestrator,
            query,
        }
    }

    /// Per-group caps for a refresh; groups without an override use their
    /// configured default.
    pub fn limits_with(&self, overrides: &[(&str, Option<usize>)]) -> Vec<GroupLimit> {
        self.config
            .groups
            .iter()
            .map(|g| {
                let max = overrides
                    .iter()
                    .find(|(name, _)| *name == g.name)
                    .and_then(|(_, max)| *max)
                    .unwrap_or(g.default_max);
                GroupLimit::new(&g.name, max)
            })
            .collect()
    }
}
