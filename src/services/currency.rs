//! Fixed-rate currency conversion

use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// Default USD to INR rate used throughout the demo
pub const DEFAULT_USD_TO_INR: f64 = 83.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    #[serde(alias = "usd")]
    Usd,
    #[serde(alias = "inr")]
    Inr,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Inr => "₹",
        }
    }
}

/// Converts foreign amounts into the rupees charged over UPI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Converter {
    usd_to_inr: f64,
}

impl Converter {
    pub fn new(usd_to_inr: f64) -> Self {
        Self { usd_to_inr }
    }

    pub fn rate(&self) -> f64 {
        self.usd_to_inr
    }

    pub fn to_inr(&self, amount: f64, currency: Currency) -> f64 {
        let inr = match currency {
            Currency::Usd => amount * self.usd_to_inr,
            Currency::Inr => amount,
        };
        round_cents(inr)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(DEFAULT_USD_TO_INR)
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse the amount typed into the start-payment form
pub fn parse_amount(raw: &str) -> Result<f64, PaymentError> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PaymentError::Validation(format!("amount '{}' is not a number", raw)))?;

    if !amount.is_finite() || amount <= 0.0 {
        return Err(PaymentError::Validation(format!("amount must be greater than zero, got {}", raw)));
    }

    Ok(round_cents(amount))
}
