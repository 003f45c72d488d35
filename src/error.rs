//! Error types for the countdown core and the payment flow

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::state::PaymentStage;

/// Errors raised by the card lifecycle timer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Countdown budget must be a positive number of seconds
    #[error("Invalid countdown duration: {0} seconds")]
    InvalidDuration(i64),
}

/// Errors raised while driving a payment through its screens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentError {
    /// The start-payment form was rejected
    #[error("Invalid payment request: {0}")]
    Validation(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    /// The payment is not in a stage that allows this step
    #[error("Cannot move payment from {from:?} to {to:?}")]
    InvalidTransition { from: PaymentStage, to: PaymentStage },

    #[error(transparent)]
    Timer(#[from] TimerError),

    /// Shared state could not be accessed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PaymentError::PaymentNotFound(_) | PaymentError::CardNotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::InvalidTransition { .. } => StatusCode::CONFLICT,
            PaymentError::Timer(_) | PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
