//! Card expiry listener background task

use std::sync::Arc;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::state::{AppState, CardExpired};

/// Subscribe to card expiries and spawn the listener.
///
/// The subscription is taken before spawning so no expiry sent after this
/// call returns can be missed.
pub fn spawn_expiry_listener(state: Arc<AppState>) -> JoinHandle<()> {
    let expiry_rx = state.expiry_tx.subscribe();
    tokio::spawn(expiry_listener_task(state, expiry_rx))
}

/// Background task that moves payments to `Expired` when their card runs out
pub async fn expiry_listener_task(state: Arc<AppState>, mut expiry_rx: broadcast::Receiver<CardExpired>) {
    info!("Starting card expiry listener");

    loop {
        match expiry_rx.recv().await {
            Ok(expired) => {
                debug!(
                    "Card {} expired after {}s at {}",
                    expired.card_id, expired.event.total_seconds, expired.event.expired_at
                );
                match state.expire_payment(expired.payment_id) {
                    Ok(Some(payment)) => {
                        info!("Card {} expired, payment {} refunded", expired.card_id, payment.id);
                    }
                    Ok(None) => {
                        debug!("Payment {} was already closed", expired.payment_id);
                    }
                    Err(e) => error!("Failed to expire payment {}: {}", expired.payment_id, e),
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Expiry listener lagged, {} notifications skipped", skipped);
                match state.expire_ran_out_cards() {
                    Ok(expired) => info!("Expired {} payments whose cards ran out", expired.len()),
                    Err(e) => error!("Failed to expire ran out cards: {}", e),
                }
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("Expiry channel closed, stopping listener");
                break;
            }
        }
    }
}
