//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod expiry_listener;
pub mod upi_confirmation;

// Re-export main functions
pub use expiry_listener::{expiry_listener_task, spawn_expiry_listener};
pub use upi_confirmation::upi_confirmation_task;
