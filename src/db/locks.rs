use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-investor write locks
///
/// Read-modify-write updates of an investor's signals run while holding that
/// investor's lock, so concurrent requests apply one after another instead of
/// overwriting each other. Clones share the same lock table.
#[derive(Clone, Default)]
pub struct InvestorLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl InvestorLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `scope` and holds it until the guard drops
    pub async fn acquire(&self, scope: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(scope.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
