//! Payment records, stages and the screens they lead to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::PaymentError,
    services::{parse_amount, Converter, Currency, Platform, Purpose},
};

/// Screens of the front-end, used as the `next` hint in responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "/")]
    Landing,
    #[serde(rename = "/start")]
    StartPayment,
    #[serde(rename = "/upi-payment")]
    UpiPayment,
    #[serde(rename = "/card-activation")]
    CardActivation,
    #[serde(rename = "/success")]
    Success,
    #[serde(rename = "/expired")]
    Expired,
    #[serde(rename = "/dashboard")]
    Dashboard,
}

/// Where a payment is in the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStage {
    /// Waiting for the user to pay over UPI
    Pending,
    /// UPI confirmation in progress
    Processing,
    /// UPI confirmed, card about to be issued
    Confirmed,
    /// Virtual card issued and counting down
    CardActive,
    Completed,
    Expired,
    Cancelled,
}

impl PaymentStage {
    pub fn can_transition_to(self, next: PaymentStage) -> bool {
        use PaymentStage::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Confirmed)
                | (Confirmed, CardActive)
                | (CardActive, Completed)
                | (CardActive, Expired)
                | (CardActive, Cancelled)
        )
    }

    /// Screen the user should be on for this stage
    pub fn route(self) -> Route {
        match self {
            PaymentStage::Pending | PaymentStage::Processing | PaymentStage::Confirmed => Route::UpiPayment,
            PaymentStage::CardActive => Route::CardActivation,
            PaymentStage::Completed => Route::Success,
            PaymentStage::Expired => Route::Expired,
            PaymentStage::Cancelled => Route::Dashboard,
        }
    }
}

/// Body of the start-payment form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub platform: String,
    pub purpose: String,
    pub amount: String,
    #[serde(default)]
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub platform: Platform,
    pub purpose: Purpose,
    pub amount: f64,
    pub currency: Currency,
    /// Rupees charged over UPI, also the refund on expiry
    pub inr_amount: f64,
    pub stage: PaymentStage,
    pub card_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Validate the form and quote the rupee amount
    pub fn from_request(request: &PaymentRequest, converter: &Converter) -> Result<Self, PaymentError> {
        let platform = Platform::from_id(&request.platform)
            .ok_or_else(|| PaymentError::Validation(format!("unknown platform '{}'", request.platform)))?;
        let purpose = Purpose::from_id(&request.purpose)
            .ok_or_else(|| PaymentError::Validation(format!("unknown purpose '{}'", request.purpose)))?;
        let amount = parse_amount(&request.amount)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            platform,
            purpose,
            amount,
            currency: request.currency,
            inr_amount: converter.to_inr(amount, request.currency),
            stage: PaymentStage::Pending,
            card_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Move to `next`, refusing anything but a forward step
    pub fn advance(&mut self, next: PaymentStage) -> Result<(), PaymentError> {
        if !self.stage.can_transition_to(next) {
            return Err(PaymentError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Refunded,
    Expired,
}

/// Entry in the dashboard payment history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub platform: Platform,
    pub amount: f64,
    pub currency: Currency,
    pub inr_amount: f64,
    pub status: TransactionStatus,
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    /// Record the outcome of a finished payment
    pub fn from_payment(payment: &Payment, status: TransactionStatus) -> Self {
        Self {
            id: payment.id.to_string(),
            platform: payment.platform.clone(),
            amount: payment.amount,
            currency: payment.currency,
            inr_amount: payment.inr_amount,
            status,
            occurred_at: Utc::now(),
        }
    }

    pub(crate) fn sample(
        id: &str,
        platform: Platform,
        amount: f64,
        inr_amount: f64,
        status: TransactionStatus,
        occurred_at: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            platform,
            amount,
            currency: Currency::Usd,
            inr_amount,
            status,
            occurred_at: occurred_at.parse().unwrap_or_else(|_| Utc::now()),
        }
    }
}
