//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(landing_handler))
        .route("/catalog", get(catalog_handler))
        .route("/payments", post(start_payment_handler))
        .route("/payments/:payment_id", get(get_payment_handler))
        .route("/payments/:payment_id/upi", post(upi_confirm_handler))
        .route("/cards/:card_id", get(card_handler))
        .route("/cards/:card_id/complete", post(complete_card_handler))
        .route("/cards/:card_id/cancel", post(cancel_card_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
