use axum::http::Method;
use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all ledger and alert endpoints.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handler::health_handler))
        .route("/blockchain/validate", get(handler::validate_handler))
        .route("/blockchain/list", get(handler::list_handler))
        .route("/blockchain/block/:index", get(handler::block_handler))
        .route(
            "/alerts",
            get(handler::alerts_handler).post(handler::raise_handler),
        )
        .route("/alerts/tourist/:temp_id", get(handler::tourist_alerts_handler))
        .route("/alerts/:alert_uuid/resolve", patch(handler::resolve_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
