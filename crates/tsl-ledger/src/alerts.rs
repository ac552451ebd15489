use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tsl_types::{AlertStatus, Block, EventPayload, IssueEvent, Report, ResolutionEvent};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::projection::{merge_alert_views, AlertFilter, AlertView};
use crate::status::AlertStatusStore;
use crate::traits::{LedgerReader, LedgerWriter};

/// Request to raise a new alert for an anonymized subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaiseAlert {
    pub temp_id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sos: bool,
    #[serde(default)]
    pub report: Option<Report>,
}

impl RaiseAlert {
    fn check(&self) -> Result<(), LedgerError> {
        if self.temp_id.trim().is_empty() {
            return Err(LedgerError::InvalidPayload("temp_id must not be empty".into()));
        }
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(LedgerError::InvalidPayload(format!("latitude {} out of range", self.lat)));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(LedgerError::InvalidPayload(format!("longitude {} out of range", self.lon)));
        }
        Ok(())
    }
}

/// Result of resolving an alert.
///
/// Resolution writes the status store first and the ledger second, with no
/// shared transaction. `LedgerPending` reports the case where the status row
/// was written but the ledger block was not; the two stores disagree until
/// the resolution is retried.
#[derive(Debug)]
pub enum ResolutionOutcome {
    Complete { status: AlertStatus, block: Block },
    LedgerPending { status: AlertStatus, error: LedgerError },
}

impl ResolutionOutcome {
    pub fn status(&self) -> &AlertStatus {
        match self {
            Self::Complete { status, .. } | Self::LedgerPending { status, .. } => status,
        }
    }

    pub fn block(&self) -> Option<&Block> {
        match self {
            Self::Complete { block, .. } => Some(block),
            Self::LedgerPending { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Alert workflows composed from the ledger and the status store.
pub struct AlertService<L> {
    ledger: Arc<L>,
    statuses: Arc<dyn AlertStatusStore>,
}

impl<L> Clone for AlertService<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            statuses: Arc::clone(&self.statuses),
        }
    }
}

impl<L: LedgerReader + LedgerWriter> AlertService<L> {
    pub fn new(ledger: Arc<L>, statuses: Arc<dyn AlertStatusStore>) -> Self {
        Self { ledger, statuses }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn statuses(&self) -> &dyn AlertStatusStore {
        self.statuses.as_ref()
    }

    /// Mint an alert id and append an `issue` block for it.
    pub fn raise(&self, request: RaiseAlert) -> Result<Block, LedgerError> {
        request.check()?;

        let alert_uuid = Uuid::now_v7().to_string();
        let mut event = IssueEvent::new(alert_uuid, request.temp_id, request.lat, request.lon);
        event.message = request.message;
        event.sos = request.sos;
        event.report = request.report.filter(|report| !report.is_empty());

        let block = self.ledger.append(EventPayload::Issue(event))?;
        info!(index = block.index, alert = ?block.alert_uuid(), "alert raised");
        Ok(block)
    }

    /// Mark an alert resolved in the status store, then record the
    /// resolution in the ledger.
    ///
    /// Returns `Err` only when the status store write fails, in which case
    /// nothing was written. A ledger failure after the status write yields
    /// [`ResolutionOutcome::LedgerPending`].
    pub fn resolve(
        &self,
        alert_uuid: &str,
        resolved_by: Option<String>,
    ) -> Result<ResolutionOutcome, LedgerError> {
        let now = Utc::now();
        let mut status = self
            .statuses
            .get(alert_uuid)?
            .unwrap_or_else(|| AlertStatus::open(alert_uuid));
        status.resolve(now, resolved_by.clone());
        let status = self.statuses.upsert(status)?;

        let block = self
            .ledger
            .find_by_alert_id(alert_uuid)
            .and_then(|origin| {
                let mut event = ResolutionEvent::new(alert_uuid);
                event.temp_id = origin.as_ref().and_then(|p| p.temp_id()).map(str::to_string);
                event.resolved_by = resolved_by;
                event.resolved_at = Some(now);
                self.ledger.append(EventPayload::Resolution(event))
            });

        match block {
            Ok(block) => {
                let mut status = status;
                status.last_block_hash = Some(block.hash.clone());
                let status = match self.statuses.upsert(status.clone()) {
                    Ok(updated) => updated,
                    Err(error) => {
                        warn!(alert = alert_uuid, %error, "could not record resolution block hash");
                        status
                    }
                };
                info!(alert = alert_uuid, index = block.index, "alert resolved");
                Ok(ResolutionOutcome::Complete { status, block })
            }
            Err(error) => {
                warn!(
                    alert = alert_uuid,
                    %error,
                    "status store resolved but ledger append failed"
                );
                Ok(ResolutionOutcome::LedgerPending { status, error })
            }
        }
    }

    /// Merged alert views, filtered.
    pub fn views(&self, filter: &AlertFilter) -> Result<Vec<AlertView>, LedgerError> {
        let chain = self.ledger.chain()?;
        let statuses = self.statuses.all()?;
        Ok(filter.apply(merge_alert_views(&chain, &statuses)))
    }
}
