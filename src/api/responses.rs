//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::{Platform, Purpose, TrustBadge},
    state::{Payment, Route, Transaction, TransactionStatus},
};

/// Response for endpoints that return a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub payment: Payment,
    pub next: Route,
}

impl PaymentResponse {
    /// Create a new payment response; `next` follows the payment stage
    pub fn new(status: &str, message: String, payment: Payment) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            next: payment.stage.route(),
            payment,
        }
    }

    pub fn ok(message: String, payment: Payment) -> Self {
        Self::new("ok", message, payment)
    }

    /// A card session ended and money is on its way back
    pub fn refunded(message: String, payment: Payment) -> Self {
        Self::new("refunded", message, payment)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeInfo {
    pub id: TrustBadge,
    pub text: String,
}

impl BadgeInfo {
    pub fn all() -> Vec<Self> {
        TrustBadge::ALL
            .into_iter()
            .map(|id| Self {
                id,
                text: id.text().to_string(),
            })
            .collect()
    }
}

/// Everything the start-payment form offers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub platforms: Vec<Platform>,
    pub purposes: Vec<Purpose>,
    pub badges: Vec<BadgeInfo>,
    pub usd_to_inr: f64,
    pub card_seconds: i64,
    pub next: Route,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingStep {
    pub num: String,
    pub title: String,
    pub desc: String,
}

/// Landing screen content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingResponse {
    pub headline: String,
    pub card_minutes: i64,
    pub steps: Vec<LandingStep>,
    pub badges: Vec<BadgeInfo>,
    pub next: Route,
}

impl LandingResponse {
    pub fn new(card_seconds: i64) -> Self {
        let card_minutes = card_seconds / 60;
        let steps = [
            ("01", "Select Service", "Choose what you're paying for".to_string()),
            ("02", "Pay via UPI", "Scan QR with any UPI app".to_string()),
            ("03", "Get Virtual Card", format!("{}-minute card generated instantly", card_minutes)),
            ("04", "Complete Payment", "Use card details on the platform".to_string()),
        ]
        .into_iter()
        .map(|(num, title, desc)| LandingStep {
            num: num.to_string(),
            title: title.to_string(),
            desc,
        })
        .collect();

        Self {
            headline: format!(
                "Get a {}-minute virtual international card instantly, paid with UPI",
                card_minutes
            ),
            card_minutes,
            steps,
            badges: BadgeInfo::all(),
            next: Route::StartPayment,
        }
    }
}

/// One row of the dashboard history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub platform: Platform,
    pub amount: f64,
    pub inr_amount: f64,
    pub status: TransactionStatus,
    pub date: String,
    pub time: String,
}

impl From<&Transaction> for TransactionRow {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id.clone(),
            platform: transaction.platform.clone(),
            amount: transaction.amount,
            inr_amount: transaction.inr_amount,
            status: transaction.status,
            date: transaction.occurred_at.format("%Y-%m-%d").to_string(),
            time: transaction.occurred_at.format("%H:%M").to_string(),
        }
    }
}

/// Dashboard stats and history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub total_cards: usize,
    pub completed: usize,
    /// Sum of rupee amounts of completed payments
    pub total_spent_inr: f64,
    pub transactions: Vec<TransactionRow>,
}

impl DashboardResponse {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let completed: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Completed)
            .collect();

        Self {
            total_cards: transactions.len(),
            completed: completed.len(),
            total_spent_inr: crate::services::currency::round_cents(
                completed.iter().map(|t| t.inr_amount).sum(),
            ),
            transactions: transactions.iter().map(TransactionRow::from).collect(),
        }
    }
}

/// Server status with live card information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub live_cards: usize,
    pub card_seconds: i64,
    pub usd_to_inr: f64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
