use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::OwnedMutexGuard;

use super::{InvestorLocks, KeyValueStore, StoreKey};
use crate::error::AppResult;
use crate::models::{
    CalibrationRecord, CalibrationSet, InteractionHistory, InteractionRecord, PreferenceProfile,
};

/// Typed access to one investor's persisted signals
///
/// Loads never fail. A missing key, an unreadable store or a malformed value
/// yields the empty default for that key alone.
///
/// Updates that depend on the stored value (`append_interaction`,
/// `upsert_calibration`) hold the investor's lock from read to write.
/// Repositories only exclude each other when they share an [`InvestorLocks`].
#[derive(Clone)]
pub struct PreferenceRepository {
    store: Arc<dyn KeyValueStore>,
    investor_id: Option<String>,
    locks: InvestorLocks,
}

impl PreferenceRepository {
    /// Repository using the bare logical keys
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            investor_id: None,
            locks: InvestorLocks::new(),
        }
    }

    /// Repository whose keys are namespaced by investor
    pub fn for_investor(store: Arc<dyn KeyValueStore>, investor_id: impl Into<String>) -> Self {
        Self {
            store,
            investor_id: Some(investor_id.into()),
            locks: InvestorLocks::new(),
        }
    }

    /// Shares a lock table with other repositories over the same store
    pub fn with_locks(mut self, locks: InvestorLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn investor_id(&self) -> Option<&str> {
        self.investor_id.as_deref()
    }

    pub async fn load_preferences(&self) -> PreferenceProfile {
        self.load_or_default(StoreKey::InvestorPreferences).await
    }

    pub async fn load_calibration(&self) -> CalibrationSet {
        self.load_or_default(StoreKey::CalibrationLearning).await
    }

    pub async fn load_interactions(&self) -> InteractionHistory {
        self.load_or_default(StoreKey::SwipeLearning).await
    }

    /// Overwrites the stored profile wholesale
    pub async fn save_preferences(&self, preferences: &PreferenceProfile) -> AppResult<()> {
        let _guard = self.lock().await;
        self.save(StoreKey::InvestorPreferences, preferences).await
    }

    /// Appends one swipe to the stored history and returns the updated history
    ///
    /// A store read error aborts the append so the stored history is never
    /// replaced by a partial one.
    pub async fn append_interaction(
        &self,
        record: InteractionRecord,
    ) -> AppResult<InteractionHistory> {
        let _guard = self.lock().await;
        let mut history: InteractionHistory = self.load_for_update(StoreKey::SwipeLearning).await?;
        history.push(record);
        self.save(StoreKey::SwipeLearning, &history).await?;
        Ok(history)
    }

    /// Replaces or adds the rating for one startup and returns the updated set
    pub async fn upsert_calibration(&self, record: CalibrationRecord) -> AppResult<CalibrationSet> {
        let _guard = self.lock().await;
        let mut calibration: CalibrationSet =
            self.load_for_update(StoreKey::CalibrationLearning).await?;
        calibration.upsert(record);
        self.save(StoreKey::CalibrationLearning, &calibration).await?;
        Ok(calibration)
    }

    pub async fn clear_calibration(&self) -> AppResult<()> {
        let _guard = self.lock().await;
        let key = self.key(StoreKey::CalibrationLearning);
        self.store.delete(&key).await
    }

    fn key(&self, key: StoreKey) -> String {
        key.scoped(self.investor_id.as_deref())
    }

    async fn lock(&self) -> OwnedMutexGuard<()> {
        self.locks.acquire(self.investor_id.as_deref().unwrap_or("")).await
    }

    /// Like `load_or_default`, but a failed read is an error
    async fn load_for_update<T: DeserializeOwned + Default>(&self, key: StoreKey) -> AppResult<T> {
        let physical_key = self.key(key);
        match self.store.get(&physical_key).await? {
            Some(raw) => Ok(Self::parse_or_default(&physical_key, &raw)),
            None => Ok(T::default()),
        }
    }

    async fn load_or_default<T: DeserializeOwned + Default>(&self, key: StoreKey) -> T {
        let physical_key = self.key(key);

        let raw = match self.store.get(&physical_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(error = %e, key = %physical_key, "Store read failed, using defaults");
                return T::default();
            }
        };

        Self::parse_or_default(&physical_key, &raw)
    }

    fn parse_or_default<T: DeserializeOwned + Default>(physical_key: &str, raw: &str) -> T {
        match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = %physical_key, "Malformed stored value, using defaults");
                T::default()
            }
        }
    }

    async fn save<T: Serialize>(&self, key: StoreKey, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(&self.key(key), json).await
    }
}
