//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::PaymentError,
    services::{Platform, Purpose},
    state::{AppState, CardView, PaymentRequest, PaymentStage, Route},
    tasks::upi_confirmation_task,
};
use super::responses::{
    BadgeInfo, CatalogResponse, DashboardResponse, HealthResponse, LandingResponse, PaymentResponse,
    StatusResponse,
};

/// Handle GET / - Landing screen content
pub async fn landing_handler(State(state): State<Arc<AppState>>) -> Json<LandingResponse> {
    Json(LandingResponse::new(state.settings.card_seconds))
}

/// Handle GET /catalog - Platforms, purposes and badges for the payment form
pub async fn catalog_handler(State(state): State<Arc<AppState>>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        platforms: Platform::all(),
        purposes: Purpose::all(),
        badges: BadgeInfo::all(),
        usd_to_inr: state.converter.rate(),
        card_seconds: state.settings.card_seconds,
        next: Route::StartPayment,
    })
}

/// Handle POST /payments - Submit the start-payment form
pub async fn start_payment_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, PaymentError> {
    match state.start_payment(&request) {
        Ok(payment) => {
            let message = format!(
                "Pay ₹{:.2} over UPI for {} ({}{:.2})",
                payment.inr_amount,
                payment.platform.name,
                payment.currency.symbol(),
                payment.amount
            );
            Ok(Json(PaymentResponse::ok(message, payment)))
        }
        Err(e) => {
            warn!("Rejected payment request: {}", e);
            Err(e)
        }
    }
}

/// Handle GET /payments/:id - Current state of a payment
pub async fn get_payment_handler(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, PaymentError> {
    let payment = state.get_payment(payment_id)?;
    let message = format!("Payment is {:?}", payment.stage);
    Ok(Json(PaymentResponse::ok(message, payment)))
}

/// Handle POST /payments/:id/upi - Start the simulated UPI confirmation
pub async fn upi_confirm_handler(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, PaymentError> {
    let payment = state.advance_payment(payment_id, PaymentStage::Processing)?;

    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        upi_confirmation_task(task_state, payment_id).await;
    });

    info!("UPI confirmation started for payment {}", payment_id);
    Ok(Json(PaymentResponse::ok(
        "Waiting for UPI confirmation".to_string(),
        payment,
    )))
}

/// Handle GET /cards/:id - Card details and countdown
pub async fn card_handler(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardView>, PaymentError> {
    Ok(Json(state.card_view(card_id)?))
}

/// Handle POST /cards/:id/complete - User finished paying with the card
pub async fn complete_card_handler(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, PaymentError> {
    match state.complete_card(card_id) {
        Ok(payment) => {
            info!("Card {} used, payment {} completed", card_id, payment.id);
            let message = format!("Payment to {} completed", payment.platform.name);
            Ok(Json(PaymentResponse::ok(message, payment)))
        }
        Err(e) => {
            warn!("Failed to complete card {}: {}", card_id, e);
            Err(e)
        }
    }
}

/// Handle POST /cards/:id/cancel - User left the card screen
pub async fn cancel_card_handler(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, PaymentError> {
    match state.cancel_card(card_id) {
        Ok(payment) => {
            info!("Card {} cancelled, refunding payment {}", card_id, payment.id);
            let message = format!(
                "₹{:.2} refund initiated, credited within 24 hours",
                payment.inr_amount
            );
            Ok(Json(PaymentResponse::refunded(message, payment)))
        }
        Err(e) => {
            warn!("Failed to cancel card {}: {}", card_id, e);
            Err(e)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Show the empty state regardless of history
    #[serde(default)]
    pub empty: bool,
}

/// Handle GET /dashboard - Payment history and stats
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, PaymentError> {
    if query.empty {
        return Ok(Json(DashboardResponse::from_transactions(&[])));
    }

    let transactions = state.get_transactions().map_err(|e| {
        error!("Failed to read transactions: {}", e);
        e
    })?;
    Ok(Json(DashboardResponse::from_transactions(&transactions)))
}

/// Handle GET /status - Return current server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, PaymentError> {
    let live_cards = match state.live_card_count() {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count live cards: {}", e);
            return Err(e);
        }
    };

    Ok(Json(StatusResponse {
        live_cards,
        card_seconds: state.settings.card_seconds,
        usd_to_inr: state.converter.rate(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
