use std::collections::HashMap;
use std::sync::RwLock;

use tsl_types::AlertStatus;

use crate::error::LedgerError;

/// Boundary to the relational store that owns mutable alert status.
///
/// The ledger only reads this state when building views; the resolution
/// workflow writes it before appending the matching ledger block.
pub trait AlertStatusStore: Send + Sync {
    fn get(&self, alert_uuid: &str) -> Result<Option<AlertStatus>, LedgerError>;

    /// Insert or replace the row keyed by `status.alert_uuid`.
    fn upsert(&self, status: AlertStatus) -> Result<AlertStatus, LedgerError>;

    /// Every row, keyed by alert id.
    fn all(&self) -> Result<HashMap<String, AlertStatus>, LedgerError>;
}

/// `HashMap`-backed status store for tests, the CLI, and local servers.
#[derive(Debug, Default)]
pub struct InMemoryAlertStatusStore {
    rows: RwLock<HashMap<String, AlertStatus>>,
}

impl InMemoryAlertStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertStatusStore for InMemoryAlertStatusStore {
    fn get(&self, alert_uuid: &str) -> Result<Option<AlertStatus>, LedgerError> {
        let rows = self.rows.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(rows.get(alert_uuid).cloned())
    }

    fn upsert(&self, status: AlertStatus) -> Result<AlertStatus, LedgerError> {
        let mut rows = self.rows.write().map_err(|_| LedgerError::LockPoisoned)?;
        rows.insert(status.alert_uuid.clone(), status.clone());
        Ok(status)
    }

    fn all(&self) -> Result<HashMap<String, AlertStatus>, LedgerError> {
        let rows = self.rows.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_row() {
        let store = InMemoryAlertStatusStore::new();
        assert!(store.get("a1").unwrap().is_none());

        store.upsert(AlertStatus::open("a1")).unwrap();
        let mut status = store.get("a1").unwrap().unwrap();
        assert!(!status.resolved);

        status.resolve(chrono::Utc::now(), None);
        store.upsert(status).unwrap();
        assert!(store.get("a1").unwrap().unwrap().resolved);
        assert_eq!(store.all().unwrap().len(), 1);
    }
}
