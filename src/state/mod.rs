//! State management module
//! 
//! This module contains the payment records, issued card sessions and the
//! shared application state that ties them together.

pub mod app_state;
pub mod card_session;
pub mod payment;

// Re-export main types
pub use app_state::AppState;
pub use card_session::{CardExpired, CardSession, CardView};
pub use payment::{Payment, PaymentRequest, PaymentStage, Route, Transaction, TransactionStatus};
