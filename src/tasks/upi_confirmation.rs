//! Simulated UPI confirmation background task

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

use crate::state::{AppState, PaymentStage};

/// Walk a processing payment through UPI success and card activation.
///
/// The payment must already be `Processing`. After the processing delay it
/// becomes `Confirmed`, and after the hand-off delay its card is issued.
pub async fn upi_confirmation_task(state: Arc<AppState>, payment_id: Uuid) {
    info!("Simulating UPI confirmation for payment {}", payment_id);

    sleep(state.settings.upi_processing).await;
    if let Err(e) = state.advance_payment(payment_id, PaymentStage::Confirmed) {
        error!("Failed to confirm UPI payment {}: {}", payment_id, e);
        return;
    }
    info!("UPI payment {} confirmed", payment_id);

    sleep(state.settings.card_handoff).await;
    match state.issue_card(payment_id) {
        Ok(payment) => {
            if let Some(card_id) = payment.card_id {
                info!("Payment {} handed off to card {}", payment_id, card_id);
            }
        }
        Err(e) => error!("Failed to issue card for payment {}: {}", payment_id, e),
    }
}
