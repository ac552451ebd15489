use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable resolution state of one alert, owned by the relational store.
///
/// The ledger never writes this record; it only reads it when building
/// alert views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStatus {
    pub alert_uuid: String,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    /// Hash of the ledger block that recorded the resolution, once appended.
    #[serde(default)]
    pub last_block_hash: Option<String>,
}

impl AlertStatus {
    /// An open alert with no resolution recorded.
    pub fn open(alert_uuid: impl Into<String>) -> Self {
        Self {
            alert_uuid: alert_uuid.into(),
            resolved: false,
            resolved_at: None,
            resolved_by: None,
            last_block_hash: None,
        }
    }

    /// Mark this alert resolved at `at` by `resolved_by`.
    pub fn resolve(&mut self, at: DateTime<Utc>, resolved_by: Option<String>) {
        self.resolved = true;
        self.resolved_at = Some(at);
        self.resolved_by = resolved_by;
    }
}
