//! TimeBound - Demo backend for time-limited virtual cards
//! 
//! A payment flow where a domestic UPI payment buys a virtual international
//! card that stays usable for a fixed countdown. Card numbers, UPI
//! confirmation and currency conversion are mocked; the card lifecycle
//! timer is the real thing.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::{Config, FlowSettings};
pub use error::{PaymentError, TimerError};
pub use state::AppState;
pub use timer::{CardLifecycleTimer, CountdownState, SeverityBand};
pub use utils::signals::shutdown_signal;
