//! Static demo data: platforms, purposes, trust badges, mock card and history

use serde::{Deserialize, Serialize};

use crate::state::{Transaction, TransactionStatus};

/// International service a card can be used for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub name: String,
    pub icon: String,
}

impl Platform {
    fn new(id: &str, name: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::new("netflix", "Netflix", "🎬"),
            Self::new("spotify", "Spotify", "🎵"),
            Self::new("chatgpt", "ChatGPT Plus", "🤖"),
            Self::new("youtube", "YouTube Premium", "📺"),
            Self::new("other", "Other Service", "🌐"),
        ]
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|platform| platform.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purpose {
    pub id: String,
    pub name: String,
}

impl Purpose {
    pub fn all() -> Vec<Self> {
        [
            ("subscription", "Subscription"),
            ("one-time", "One-time Purchase"),
            ("trial", "Free Trial Signup"),
        ]
        .into_iter()
        .map(|(id, name)| Self {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|purpose| purpose.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustBadge {
    Secure,
    Refund,
    Instant,
    Protected,
}

impl TrustBadge {
    pub const ALL: [TrustBadge; 4] = [
        TrustBadge::Secure,
        TrustBadge::Refund,
        TrustBadge::Instant,
        TrustBadge::Protected,
    ];

    pub fn text(self) -> &'static str {
        match self {
            TrustBadge::Secure => "Bank-Grade Security",
            TrustBadge::Refund => "100% Refund Guaranteed",
            TrustBadge::Instant => "Instant Activation",
            TrustBadge::Protected => "RBI Compliant",
        }
    }
}

/// Details printed on an issued virtual card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
}

impl CardDetails {
    /// Every card in the demo carries the same test number
    pub fn mock() -> Self {
        Self {
            number: "4532015112830366".to_string(),
            expiry: "12/25".to_string(),
            cvv: "847".to_string(),
        }
    }
}

/// Sample payment history shown on a fresh dashboard
pub fn sample_transactions() -> Vec<Transaction> {
    let platforms = Platform::all();
    let find = |id: &str| {
        platforms
            .iter()
            .find(|platform| platform.id == id)
            .cloned()
            .unwrap_or_else(|| Platform::new(id, id, "🌐"))
    };

    vec![
        Transaction::sample("1", find("netflix"), 15.99, 1335.17, TransactionStatus::Completed, "2024-01-15T14:32:00Z"),
        Transaction::sample("2", find("chatgpt"), 20.00, 1670.00, TransactionStatus::Completed, "2024-01-10T09:15:00Z"),
        Transaction::sample("3", find("spotify"), 9.99, 834.17, TransactionStatus::Refunded, "2024-01-08T18:45:00Z"),
    ]
}
