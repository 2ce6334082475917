use std::fmt::Display;

use crate::error::AppResult;

/// Logical keys under which investor signals are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    InvestorPreferences,
    CalibrationLearning,
    SwipeLearning,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::InvestorPreferences => "investorPreferences",
            StoreKey::CalibrationLearning => "calibrationLearning",
            StoreKey::SwipeLearning => "swipeLearning",
        }
    }

    /// Physical key, optionally namespaced by investor
    pub fn scoped(&self, investor_id: Option<&str>) -> String {
        match investor_id {
            Some(id) => format!("investor:{}:{}", id, self),
            None => self.to_string(),
        }
    }
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// String key-value storage backing the investor signals
///
/// Values are JSON documents. A write has been applied once `set` or `delete`
/// returns `Ok`, so a following `get` observes it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;
}
