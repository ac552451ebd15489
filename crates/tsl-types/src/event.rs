use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::BlockType;

/// Optional incident report attached to a raised alert.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Image reference or inline data, stored verbatim.
    #[serde(default)]
    pub image: Option<String>,
}

impl Report {
    /// Returns `true` if no field of the report carries content.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.image.is_none()
    }
}

/// A newly raised alert (panic button, SOS, or incident report).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IssueEvent {
    pub alert_uuid: String,
    /// Anonymized subject identifier; never the permanent tourist id.
    pub temp_id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sos: bool,
    #[serde(default)]
    pub report: Option<Report>,
    /// Fields written by older producers. Kept so re-serialization hashes
    /// to the same digest.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl IssueEvent {
    pub fn new(alert_uuid: impl Into<String>, temp_id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            alert_uuid: alert_uuid.into(),
            temp_id: temp_id.into(),
            lat,
            lon,
            message: None,
            sos: false,
            report: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Closure of a previously raised alert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEvent {
    pub alert_uuid: String,
    /// Subject of the resolved alert, recovered from the issue block when known.
    #[serde(default)]
    pub temp_id: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ResolutionEvent {
    pub fn new(alert_uuid: impl Into<String>) -> Self {
        Self {
            alert_uuid: alert_uuid.into(),
            temp_id: None,
            resolved: true,
            resolved_by: None,
            resolved_at: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Structured payload of a non-genesis block.
///
/// The variant decides the block's `type` tag, so a payload can never be
/// written under the wrong category.
#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
    Issue(IssueEvent),
    Resolution(ResolutionEvent),
}

impl EventPayload {
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Issue(_) => BlockType::Issue,
            Self::Resolution(_) => BlockType::Resolution,
        }
    }

    pub fn alert_uuid(&self) -> &str {
        match self {
            Self::Issue(e) => &e.alert_uuid,
            Self::Resolution(e) => &e.alert_uuid,
        }
    }

    pub fn temp_id(&self) -> Option<&str> {
        match self {
            Self::Issue(e) => Some(&e.temp_id),
            Self::Resolution(e) => e.temp_id.as_deref(),
        }
    }

    pub fn as_issue(&self) -> Option<&IssueEvent> {
        match self {
            Self::Issue(e) => Some(e),
            Self::Resolution(_) => None,
        }
    }

    pub fn as_resolution(&self) -> Option<&ResolutionEvent> {
        match self {
            Self::Resolution(e) => Some(e),
            Self::Issue(_) => None,
        }
    }
}

impl From<IssueEvent> for EventPayload {
    fn from(event: IssueEvent) -> Self {
        Self::Issue(event)
    }
}

impl From<ResolutionEvent> for EventPayload {
    fn from(event: ResolutionEvent) -> Self {
        Self::Resolution(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn issue_preserves_unknown_fields() {
        let raw = json!({
            "alert_uuid": "a1",
            "temp_id": "t1",
            "lat": 1.0,
            "lon": 2.0,
            "message": null,
            "sos": true,
            "report": null,
            "timestamp": "2025-01-01T00:00:00+00:00"
        });
        let event: IssueEvent = serde_json::from_value(raw.clone()).unwrap();
        assert!(event.extra.contains_key("timestamp"));
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn issue_accepts_integer_coordinates() {
        let event: IssueEvent =
            serde_json::from_value(json!({"alert_uuid": "a", "temp_id": "t", "lat": 10, "lon": -3}))
                .unwrap();
        assert_eq!(event.lat, 10.0);
        assert_eq!(event.lon, -3.0);
        assert!(!event.sos);
    }

    #[test]
    fn resolution_defaults_optional_fields() {
        let event: ResolutionEvent =
            serde_json::from_value(json!({"alert_uuid": "a1", "resolved": true, "resolved_by": "op1"}))
                .unwrap();
        assert!(event.resolved);
        assert_eq!(event.resolved_by.as_deref(), Some("op1"));
        assert!(event.temp_id.is_none());
        assert!(event.resolved_at.is_none());
    }

    #[test]
    fn payload_accessors() {
        let issue = EventPayload::from(IssueEvent::new("a1", "t1", 0.0, 0.0));
        assert_eq!(issue.block_type(), BlockType::Issue);
        assert_eq!(issue.temp_id(), Some("t1"));
        assert!(issue.as_resolution().is_none());

        let resolution = EventPayload::from(ResolutionEvent::new("a1"));
        assert_eq!(resolution.block_type(), BlockType::Resolution);
        assert_eq!(resolution.alert_uuid(), "a1");
        assert_eq!(resolution.temp_id(), None);
    }

    #[test]
    fn empty_report() {
        assert!(Report::default().is_empty());
        let report = Report {
            title: Some("lost".into()),
            ..Report::default()
        };
        assert!(!report.is_empty());
    }
}
