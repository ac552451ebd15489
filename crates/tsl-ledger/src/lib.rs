//! Hash-chained ledger of tourist safety events.
//!
//! This crate is the engine every collaborator calls. It provides:
//! - [`Ledger`]: append, list, fetch-by-index, fetch-by-alert-id, validate,
//!   with all appends serialized through one lock per ledger instance
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - [`ValidationReport`] listing every broken invariant for audits
//! - Alert projections merging chain blocks with external resolution state
//! - [`AlertService`] raise/resolve workflows, including the detectable
//!   dual-write outcome of a resolution

pub mod alerts;
pub mod engine;
pub mod error;
pub mod projection;
pub mod status;
pub mod traits;
pub mod validation;

pub use alerts::{AlertService, RaiseAlert, ResolutionOutcome};
pub use engine::Ledger;
pub use error::LedgerError;
pub use projection::{merge_alert_views, AlertFilter, AlertView, ResolutionSource};
pub use status::{AlertStatusStore, InMemoryAlertStatusStore};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::ValidationReport;
