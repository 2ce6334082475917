use std::sync::Arc;

use crate::db::{InMemoryStore, InvestorLocks, KeyValueStore, PreferenceRepository};
use crate::services::RecommendationEngine;

/// Shared application state
///
/// Holds the store handle and the per-investor write locks. Recommendation
/// engines are built per request so no investor's signals outlive the request
/// that loaded them.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    locks: InvestorLocks,
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            locks: InvestorLocks::new(),
        }
    }

    /// State backed by a process-local store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    pub fn repository(&self, investor_id: &str) -> PreferenceRepository {
        PreferenceRepository::for_investor(self.store.clone(), investor_id)
            .with_locks(self.locks.clone())
    }

    /// Loads a fresh engine for the investor's session
    pub async fn engine(&self, investor_id: &str) -> RecommendationEngine {
        RecommendationEngine::load(self.repository(investor_id)).await
    }
}
