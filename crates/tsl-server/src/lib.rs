//! HTTP adapter for the tourist safety ledger.
//!
//! A thin axum layer over [`tsl_ledger`]: every handler forwards to the
//! ledger or the alert workflows on the blocking pool and maps
//! [`tsl_ledger::LedgerError`] onto HTTP status codes.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::TslServer;
pub use state::{AppState, SharedLedger};
