//! Mocked collaborators of the payment flow
//!
//! This module contains the static data provider, the fixed-rate currency
//! converter and card formatting helpers.

pub mod card;
pub mod catalog;
pub mod currency;

// Re-export main types
pub use card::{copy_all_text, format_card_number};
pub use catalog::{sample_transactions, CardDetails, Platform, Purpose, TrustBadge};
pub use currency::{parse_amount, Converter, Currency, DEFAULT_USD_TO_INR};
