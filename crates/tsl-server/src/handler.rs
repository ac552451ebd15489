use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tsl_ledger::{AlertFilter, AlertView, LedgerError, LedgerReader, RaiseAlert, ResolutionOutcome};
use tsl_types::{Block, EventPayload};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Run a blocking ledger call off the async executor.
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(ServerError::from)
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub block_count: u64,
}

/// `GET /blockchain/validate`: 200 when intact, 400 naming the first broken
/// block otherwise.
pub async fn validate_handler(State(state): State<AppState>) -> ServerResult<Json<ValidateResponse>> {
    let chain = blocking(move || state.ledger.chain()).await?;
    chain.validate().map_err(LedgerError::from)?;
    Ok(Json(ValidateResponse {
        valid: true,
        block_count: chain.len() as u64,
    }))
}

/// `GET /blockchain/list`: the whole chain document.
pub async fn list_handler(State(state): State<AppState>) -> ServerResult<impl IntoResponse> {
    let chain = blocking(move || state.ledger.chain()).await?;
    Ok(Json(chain))
}

pub async fn block_handler(
    State(state): State<AppState>,
    Path(index): Path<u64>,
) -> ServerResult<Json<Block>> {
    let block = blocking(move || state.ledger.block_at(index)).await?;
    Ok(Json(block))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertQuery {
    pub unresolved_only: bool,
    pub include_resolutions: Option<bool>,
}

impl AlertQuery {
    fn filter(self, temp_id: Option<String>) -> AlertFilter {
        let defaults = AlertFilter::default();
        AlertFilter {
            unresolved_only: self.unresolved_only,
            temp_id,
            include_resolutions: self
                .include_resolutions
                .unwrap_or(defaults.include_resolutions),
        }
    }
}

pub async fn alerts_handler(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> ServerResult<Json<Vec<AlertView>>> {
    let filter = query.filter(None);
    let views = blocking(move || state.alerts.views(&filter)).await?;
    Ok(Json(views))
}

pub async fn tourist_alerts_handler(
    State(state): State<AppState>,
    Path(temp_id): Path<String>,
    Query(query): Query<AlertQuery>,
) -> ServerResult<Json<Vec<AlertView>>> {
    let filter = query.filter(Some(temp_id));
    let views = blocking(move || state.alerts.views(&filter)).await?;
    Ok(Json(views))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RaisedAlert {
    pub alert_uuid: String,
    pub temp_id: String,
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
    pub blockchain_index: u64,
    pub blockchain_hash: String,
}

/// `POST /alerts`: append an `issue` block for a new alert.
pub async fn raise_handler(
    State(state): State<AppState>,
    Json(request): Json<RaiseAlert>,
) -> ServerResult<(StatusCode, Json<RaisedAlert>)> {
    let block = blocking(move || state.alerts.raise(request)).await?;
    let issue = block
        .payload()
        .and_then(EventPayload::as_issue)
        .ok_or_else(|| ServerError::Internal(format!("block {} is not an issue", block.index)))?;

    let body = RaisedAlert {
        alert_uuid: issue.alert_uuid.clone(),
        temp_id: issue.temp_id.clone(),
        lat: issue.lat,
        lon: issue.lon,
        timestamp: block.timestamp,
        blockchain_index: block.index,
        blockchain_hash: block.hash.clone(),
    };
    Ok((StatusCode::CREATED, Json(body)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveQuery {
    pub resolved_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolvedAlert {
    pub alert_uuid: String,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub blockchain_index: Option<u64>,
    pub blockchain_hash: Option<String>,
    /// Set when the status was stored but the ledger block was not written.
    pub ledger_pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_error: Option<String>,
}

/// `PATCH /alerts/:alert_uuid/resolve`.
///
/// Answers 207 when only the status store accepted the resolution.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Path(alert_uuid): Path<String>,
    Query(query): Query<ResolveQuery>,
) -> ServerResult<(StatusCode, Json<ResolvedAlert>)> {
    let outcome = blocking(move || state.alerts.resolve(&alert_uuid, query.resolved_by)).await?;

    let status = outcome.status();
    let mut body = ResolvedAlert {
        alert_uuid: status.alert_uuid.clone(),
        resolved: status.resolved,
        resolved_at: status.resolved_at,
        resolved_by: status.resolved_by.clone(),
        blockchain_index: outcome.block().map(|b| b.index),
        blockchain_hash: outcome.block().map(|b| b.hash.clone()),
        ledger_pending: false,
        ledger_error: None,
    };

    let code = match &outcome {
        ResolutionOutcome::Complete { .. } => StatusCode::OK,
        ResolutionOutcome::LedgerPending { error, .. } => {
            body.ledger_pending = true;
            body.ledger_error = Some(error.to_string());
            StatusCode::MULTI_STATUS
        }
    };
    Ok((code, Json(body)))
}
