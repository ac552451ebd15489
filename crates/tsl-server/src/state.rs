use std::sync::Arc;

use tsl_ledger::{AlertService, AlertStatusStore, Ledger};
use tsl_store::{ChainStore, FileChainStore, StoreConfig};

use crate::error::ServerResult;

/// Ledger type served over HTTP; the backend is chosen at startup.
pub type SharedLedger = Ledger<Box<dyn ChainStore>>;

/// Shared state handed to every request handler. Clones share the ledger.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<SharedLedger>,
    pub alerts: AlertService<SharedLedger>,
}

impl AppState {
    pub fn new(ledger: Arc<SharedLedger>, statuses: Arc<dyn AlertStatusStore>) -> Self {
        Self {
            alerts: AlertService::new(Arc::clone(&ledger), statuses),
            ledger,
        }
    }

    /// Open the file-backed ledger described by `store`.
    pub fn open(store: &StoreConfig, statuses: Arc<dyn AlertStatusStore>) -> ServerResult<Self> {
        let backend: Box<dyn ChainStore> = Box::new(FileChainStore::new(store.clone()));
        let ledger = Ledger::open(backend)?;
        Ok(Self::new(Arc::new(ledger), statuses))
    }
}
