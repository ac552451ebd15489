use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsl_crypto::Chain;
use tsl_types::{AlertStatus, BlockType, EventPayload, IssueEvent, ResolutionEvent};

/// Where an [`AlertView`]'s resolution fields came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The relational store has a status row for the alert.
    StatusStore,
    /// No status row; the latest resolution block in the chain was used.
    Ledger,
    /// Neither source knows of a resolution.
    Unresolved,
}

/// Response-ready row for one alert-carrying block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertView {
    pub alert_uuid: String,
    pub temp_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub message: Option<String>,
    pub sos: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "blockchain_index")]
    pub block_index: u64,
    #[serde(rename = "blockchain_hash")]
    pub block_hash: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolution_source: ResolutionSource,
}

/// Merge chain blocks with externally owned resolution state.
///
/// One view per non-genesis block, in chain order. Resolution fields come
/// from `statuses` when it has a row for the alert; otherwise from the
/// latest resolution block for that alert in `chain`; otherwise the alert is
/// unresolved. Resolution rows borrow coordinates and message from the issue
/// they close when that issue is in the chain.
///
/// Pure: filtering is left to [`AlertFilter`].
pub fn merge_alert_views(chain: &Chain, statuses: &HashMap<String, AlertStatus>) -> Vec<AlertView> {
    let mut issues: HashMap<&str, &IssueEvent> = HashMap::new();
    let mut resolutions: HashMap<&str, &ResolutionEvent> = HashMap::new();
    for payload in chain.iter().filter_map(|block| block.payload()) {
        match payload {
            EventPayload::Issue(issue) => {
                issues.entry(issue.alert_uuid.as_str()).or_insert(issue);
            }
            EventPayload::Resolution(resolution) => {
                resolutions.insert(resolution.alert_uuid.as_str(), resolution);
            }
        }
    }

    chain
        .iter()
        .filter_map(|block| block.payload().map(|payload| (block, payload)))
        .map(|(block, payload)| {
            let alert_uuid = payload.alert_uuid();
            let origin = match payload {
                EventPayload::Issue(issue) => Some(issue),
                EventPayload::Resolution(_) => issues.get(alert_uuid).copied(),
            };

            let (resolved, resolved_at, resolved_by, resolution_source) =
                match (statuses.get(alert_uuid), resolutions.get(alert_uuid)) {
                    (Some(status), _) => (
                        status.resolved,
                        status.resolved_at,
                        status.resolved_by.clone(),
                        ResolutionSource::StatusStore,
                    ),
                    (None, Some(resolution)) => (
                        resolution.resolved,
                        resolution.resolved_at,
                        resolution.resolved_by.clone(),
                        ResolutionSource::Ledger,
                    ),
                    (None, None) => (false, None, None, ResolutionSource::Unresolved),
                };

            AlertView {
                alert_uuid: alert_uuid.to_string(),
                temp_id: payload
                    .temp_id()
                    .or_else(|| origin.map(|issue| issue.temp_id.as_str()))
                    .map(str::to_string),
                lat: origin.map(|issue| issue.lat),
                lon: origin.map(|issue| issue.lon),
                message: origin.and_then(|issue| issue.message.clone()),
                sos: origin.is_some_and(|issue| issue.sos),
                timestamp: block.timestamp,
                block_index: block.index,
                block_hash: block.hash.clone(),
                block_type: payload.block_type(),
                resolved,
                resolved_at,
                resolved_by,
                resolution_source,
            }
        })
        .collect()
}

/// Caller-side selection over merged alert views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFilter {
    /// Keep only views whose alert is not resolved.
    pub unresolved_only: bool,
    /// Keep only views for this anonymized subject.
    pub temp_id: Option<String>,
    /// Keep rows produced by `resolution` blocks.
    pub include_resolutions: bool,
}

impl Default for AlertFilter {
    fn default() -> Self {
        Self {
            unresolved_only: false,
            temp_id: None,
            include_resolutions: true,
        }
    }
}

impl AlertFilter {
    pub fn matches(&self, view: &AlertView) -> bool {
        if self.unresolved_only && view.resolved {
            return false;
        }
        if !self.include_resolutions && view.block_type == BlockType::Resolution {
            return false;
        }
        match &self.temp_id {
            Some(temp_id) => view.temp_id.as_deref() == Some(temp_id.as_str()),
            None => true,
        }
    }

    pub fn apply(&self, views: Vec<AlertView>) -> Vec<AlertView> {
        views.into_iter().filter(|view| self.matches(view)).collect()
    }
}
