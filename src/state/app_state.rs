//! Main application state management

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::FlowSettings,
    error::PaymentError,
    services::{sample_transactions, Converter},
    timer::{CardLifecycleTimer, IntervalTrigger},
};
use super::{
    CardExpired, CardSession, CardView, Payment, PaymentRequest, PaymentStage, Transaction,
    TransactionStatus,
};

/// Main application state: payments, issued cards and history
pub struct AppState {
    /// Payments by id
    pub payments: Arc<Mutex<HashMap<Uuid, Payment>>>,
    /// Issued cards by card id
    pub cards: Arc<Mutex<HashMap<Uuid, CardSession<IntervalTrigger>>>>,
    /// Dashboard history, newest first
    pub transactions: Arc<Mutex<Vec<Transaction>>>,
    pub settings: FlowSettings,
    pub converter: Converter,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Channel card timers report expiry on
    pub expiry_tx: broadcast::Sender<CardExpired>,
    /// Keep the receiver alive to prevent channel closure
    pub _expiry_rx: broadcast::Receiver<CardExpired>,
}

impl AppState {
    /// Create a new AppState seeded with the sample history
    pub fn new(port: u16, host: String, settings: FlowSettings) -> Self {
        let (expiry_tx, expiry_rx) = broadcast::channel(100);

        Self {
            payments: Arc::new(Mutex::new(HashMap::new())),
            cards: Arc::new(Mutex::new(HashMap::new())),
            transactions: Arc::new(Mutex::new(sample_transactions())),
            converter: Converter::new(settings.usd_to_inr),
            settings,
            start_time: Instant::now(),
            port,
            host,
            expiry_tx,
            _expiry_rx: expiry_rx,
        }
    }

    fn lock_payments(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Payment>>, PaymentError> {
        self.payments
            .lock()
            .map_err(|e| PaymentError::Internal(format!("Failed to lock payments: {}", e)))
    }

    fn lock_cards(&self) -> Result<MutexGuard<'_, HashMap<Uuid, CardSession<IntervalTrigger>>>, PaymentError> {
        self.cards
            .lock()
            .map_err(|e| PaymentError::Internal(format!("Failed to lock cards: {}", e)))
    }

    fn lock_transactions(&self) -> Result<MutexGuard<'_, Vec<Transaction>>, PaymentError> {
        self.transactions
            .lock()
            .map_err(|e| PaymentError::Internal(format!("Failed to lock transactions: {}", e)))
    }

    /// Validate the start-payment form and open a pending payment
    pub fn start_payment(&self, request: &PaymentRequest) -> Result<Payment, PaymentError> {
        let payment = Payment::from_request(request, &self.converter)?;
        info!(
            "Payment {} opened: {} {:.2} {:?} (₹{:.2})",
            payment.id, payment.platform.name, payment.amount, payment.currency, payment.inr_amount
        );

        self.lock_payments()?.insert(payment.id, payment.clone());
        Ok(payment)
    }

    pub fn get_payment(&self, payment_id: Uuid) -> Result<Payment, PaymentError> {
        self.lock_payments()?
            .get(&payment_id)
            .cloned()
            .ok_or_else(|| PaymentError::PaymentNotFound(payment_id.to_string()))
    }

    /// Move a payment one stage forward
    pub fn advance_payment(&self, payment_id: Uuid, next: PaymentStage) -> Result<Payment, PaymentError> {
        let mut payments = self.lock_payments()?;
        let payment = payments
            .get_mut(&payment_id)
            .ok_or_else(|| PaymentError::PaymentNotFound(payment_id.to_string()))?;

        payment.advance(next)?;
        let updated = payment.clone();
        drop(payments); // Release the lock early

        info!("Payment {} moved to {:?}", payment_id, next);
        Ok(updated)
    }

    /// Issue the virtual card for a confirmed payment and start its countdown
    pub fn issue_card(&self, payment_id: Uuid) -> Result<Payment, PaymentError> {
        let card_id = Uuid::new_v4();
        let expiry_tx = self.expiry_tx.clone();
        let mut session = CardSession::new(
            card_id,
            payment_id,
            CardLifecycleTimer::create(
                self.settings.card_seconds,
                IntervalTrigger::new(self.settings.tick_period),
                move |event| {
                    let expired = CardExpired { card_id, payment_id, event };
                    if let Err(e) = expiry_tx.send(expired) {
                        warn!("Failed to send expiry of card {}: {}", card_id, e);
                    }
                },
            )?,
        );

        let payment = {
            let mut payments = self.lock_payments()?;
            let payment = payments
                .get_mut(&payment_id)
                .ok_or_else(|| PaymentError::PaymentNotFound(payment_id.to_string()))?;
            payment.advance(PaymentStage::CardActive)?;
            payment.card_id = Some(card_id);
            payment.clone()
        };

        session.activate();
        self.lock_cards()?.insert(card_id, session);

        info!(
            "Card {} issued for payment {}, valid for {}s",
            card_id, payment_id, self.settings.card_seconds
        );
        Ok(payment)
    }

    /// Current view of an issued card, including its countdown
    pub fn card_view(&self, card_id: Uuid) -> Result<CardView, PaymentError> {
        let payment_id = self
            .lock_cards()?
            .get(&card_id)
            .map(|session| session.payment_id)
            .ok_or_else(|| PaymentError::CardNotFound(card_id.to_string()))?;
        let payment = self.get_payment(payment_id)?;

        let cards = self.lock_cards()?;
        let session = cards
            .get(&card_id)
            .ok_or_else(|| PaymentError::CardNotFound(card_id.to_string()))?;
        Ok(session.view(&payment))
    }

    /// Stop a card's countdown. Returns its payment and whether it had
    /// already run out.
    fn release_card(&self, card_id: Uuid) -> Result<(Uuid, bool), PaymentError> {
        let mut cards = self.lock_cards()?;
        let session = cards
            .get_mut(&card_id)
            .ok_or_else(|| PaymentError::CardNotFound(card_id.to_string()))?;

        // Once released, no expiry can fire, so the check below is final
        session.release();
        Ok((session.payment_id, session.is_expired()))
    }

    /// Finish a card session early and record the outcome
    fn close_card(
        &self,
        card_id: Uuid,
        stage: PaymentStage,
        status: TransactionStatus,
    ) -> Result<Payment, PaymentError> {
        let (payment_id, ran_out) = self.release_card(card_id)?;

        if ran_out {
            self.expire_payment(payment_id)?;
            return Err(PaymentError::InvalidTransition {
                from: PaymentStage::Expired,
                to: stage,
            });
        }

        let payment = self.advance_payment(payment_id, stage)?;
        self.record_transaction(Transaction::from_payment(&payment, status))?;
        Ok(payment)
    }

    /// The user finished paying on the platform with the card
    pub fn complete_card(&self, card_id: Uuid) -> Result<Payment, PaymentError> {
        self.close_card(card_id, PaymentStage::Completed, TransactionStatus::Completed)
    }

    /// The user left the card screen; the amount goes back over UPI
    pub fn cancel_card(&self, card_id: Uuid) -> Result<Payment, PaymentError> {
        self.close_card(card_id, PaymentStage::Cancelled, TransactionStatus::Refunded)
    }

    /// Mark a payment expired if its card is still active. Returns the
    /// payment when this call made the change.
    pub fn expire_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, PaymentError> {
        let expired = {
            let mut payments = self.lock_payments()?;
            let payment = payments
                .get_mut(&payment_id)
                .ok_or_else(|| PaymentError::PaymentNotFound(payment_id.to_string()))?;

            if payment.stage != PaymentStage::CardActive {
                debug!("Payment {} already {:?}, expiry ignored", payment_id, payment.stage);
                return Ok(None);
            }
            payment.advance(PaymentStage::Expired)?;
            payment.clone()
        };

        info!(
            "Payment {} expired, refunding ₹{:.2}",
            payment_id, expired.inr_amount
        );
        self.record_transaction(Transaction::from_payment(&expired, TransactionStatus::Expired))?;
        Ok(Some(expired))
    }

    /// Expire every payment whose card ran out while it is still marked
    /// active. Catches up on expiry notifications that were dropped.
    pub fn expire_ran_out_cards(&self) -> Result<Vec<Payment>, PaymentError> {
        let ran_out: Vec<Uuid> = self
            .lock_cards()?
            .values()
            .filter(|session| session.is_expired())
            .map(|session| session.payment_id)
            .collect();

        let mut expired = Vec::new();
        for payment_id in ran_out {
            if let Some(payment) = self.expire_payment(payment_id)? {
                expired.push(payment);
            }
        }
        Ok(expired)
    }

    fn record_transaction(&self, transaction: Transaction) -> Result<(), PaymentError> {
        self.lock_transactions()?.insert(0, transaction);
        Ok(())
    }

    /// Payment history, newest first
    pub fn get_transactions(&self) -> Result<Vec<Transaction>, PaymentError> {
        Ok(self.lock_transactions()?.clone())
    }

    /// Number of cards still counting down
    pub fn live_card_count(&self) -> Result<usize, PaymentError> {
        Ok(self
            .lock_payments()?
            .values()
            .filter(|payment| payment.stage == PaymentStage::CardActive)
            .count())
    }

    /// Stop every card countdown, used on shutdown
    pub fn release_all_cards(&self) -> Result<usize, PaymentError> {
        let mut cards = self.lock_cards()?;
        for session in cards.values_mut() {
            session.release();
        }
        Ok(cards.len())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::{services::Currency, state::Route};

    fn settings(card_seconds: i64) -> FlowSettings {
        FlowSettings {
            card_seconds,
            ..FlowSettings::default()
        }
    }

    fn request() -> PaymentRequest {
        PaymentRequest {
            platform: "chatgpt".to_string(),
            purpose: "subscription".to_string(),
            amount: "20".to_string(),
            currency: Currency::Usd,
        }
    }

    fn confirmed_payment(state: &AppState) -> Uuid {
        let payment = state.start_payment(&request()).unwrap();
        state.advance_payment(payment.id, PaymentStage::Processing).unwrap();
        state.advance_payment(payment.id, PaymentStage::Confirmed).unwrap();
        payment.id
    }

    #[tokio::test(start_paused = true)]
    async fn test_issue_card_counts_down() {
        let state = AppState::new(0, "127.0.0.1".to_string(), settings(600));
        let payment_id = confirmed_payment(&state);

        let payment = state.issue_card(payment_id).unwrap();
        let card_id = payment.card_id.unwrap();
        assert_eq!(payment.stage, PaymentStage::CardActive);
        assert_eq!(state.live_card_count().unwrap(), 1);

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let view = state.card_view(card_id).unwrap();
        assert_eq!(view.countdown.remaining_seconds, 590);
        assert!(view.active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_sent_once() {
        let state = AppState::new(0, "127.0.0.1".to_string(), settings(3));
        let mut expiry_rx = state.expiry_tx.subscribe();
        let payment_id = confirmed_payment(&state);
        let card_id = state.issue_card(payment_id).unwrap().card_id.unwrap();

        let expired = expiry_rx.recv().await.unwrap();
        assert_eq!(expired.card_id, card_id);
        assert_eq!(expired.payment_id, payment_id);
        assert_eq!(expired.event.total_seconds, 3);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(expiry_rx.try_recv().is_err());

        let payment = state.expire_payment(payment_id).unwrap().unwrap();
        assert_eq!(payment.stage, PaymentStage::Expired);
        assert!(state.expire_payment(payment_id).unwrap().is_none());

        let history = state.get_transactions().unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].status, TransactionStatus::Expired);
        assert_eq!(history[0].inr_amount, 1670.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_stops_countdown() {
        let state = AppState::new(0, "127.0.0.1".to_string(), settings(5));
        let mut expiry_rx = state.expiry_tx.subscribe();
        let payment_id = confirmed_payment(&state);
        let card_id = state.issue_card(payment_id).unwrap().card_id.unwrap();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        let payment = state.complete_card(card_id).unwrap();
        assert_eq!(payment.stage, PaymentStage::Completed);
        assert_eq!(payment.stage.route(), Route::Success);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(expiry_rx.try_recv().is_err());
        assert_eq!(state.card_view(card_id).unwrap().countdown.remaining_seconds, 3);
        assert_eq!(state.get_transactions().unwrap()[0].status, TransactionStatus::Completed);

        assert!(matches!(
            state.complete_card(card_id),
            Err(PaymentError::InvalidTransition { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_after_countdown_ran_out() {
        let state = AppState::new(0, "127.0.0.1".to_string(), settings(1));
        let payment_id = confirmed_payment(&state);
        let card_id = state.issue_card(payment_id).unwrap().card_id.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            state.complete_card(card_id),
            Err(PaymentError::InvalidTransition {
                from: PaymentStage::Expired,
                to: PaymentStage::Completed,
            })
        );
        assert_eq!(state.get_payment(payment_id).unwrap().stage, PaymentStage::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_expires_ran_out_cards() {
        let state = AppState::new(0, "127.0.0.1".to_string(), settings(2));
        let ran_out = confirmed_payment(&state);
        state.issue_card(ran_out).unwrap();

        let other = confirmed_payment(&state);

        tokio::time::sleep(Duration::from_secs(3)).await;
        // Nothing consumed the expiry notification
        assert_eq!(state.get_payment(ran_out).unwrap().stage, PaymentStage::CardActive);
        assert_eq!(state.live_card_count().unwrap(), 1);

        let expired = state.expire_ran_out_cards().unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, ran_out);
        assert_eq!(expired[0].stage, PaymentStage::Expired);
        assert_eq!(state.live_card_count().unwrap(), 0);
        assert_eq!(state.get_payment(other).unwrap().stage, PaymentStage::Confirmed);

        assert!(state.expire_ran_out_cards().unwrap().is_empty());
        assert_eq!(state.get_transactions().unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_refunds() {
        let state = AppState::new(0, "127.0.0.1".to_string(), settings(600));
        let payment_id = confirmed_payment(&state);
        let card_id = state.issue_card(payment_id).unwrap().card_id.unwrap();

        let payment = state.cancel_card(card_id).unwrap();
        assert_eq!(payment.stage.route(), Route::Dashboard);
        assert_eq!(state.get_transactions().unwrap()[0].status, TransactionStatus::Refunded);
        assert_eq!(state.live_card_count().unwrap(), 0);
    }

    #[test]
    fn test_issue_requires_confirmed_payment() {
        let state = AppState::new(0, "127.0.0.1".to_string(), settings(600));
        let payment = state.start_payment(&request()).unwrap();
        assert_eq!(
            state.issue_card(payment.id),
            Err(PaymentError::InvalidTransition {
                from: PaymentStage::Pending,
                to: PaymentStage::CardActive,
            })
        );
        assert!(matches!(
            state.issue_card(Uuid::new_v4()),
            Err(PaymentError::PaymentNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_budget_rejected_at_issue() {
        let state = AppState::new(0, "127.0.0.1".to_string(), settings(0));
        let payment_id = confirmed_payment(&state);
        assert_eq!(
            state.issue_card(payment_id),
            Err(PaymentError::Timer(crate::error::TimerError::InvalidDuration(0)))
        );
        assert_eq!(state.get_payment(payment_id).unwrap().stage, PaymentStage::Confirmed);
    }

    #[test]
    fn test_advance_reports_next_screen() {
        let state = AppState::new(0, "127.0.0.1".to_string(), settings(600));
        let payment = state.start_payment(&request()).unwrap();
        assert_eq!(payment.stage.route(), Route::UpiPayment);

        let payment = state.advance_payment(payment.id, PaymentStage::Processing).unwrap();
        assert_eq!(payment.stage, PaymentStage::Processing);
        assert_eq!(state.get_payment(payment.id).unwrap(), payment);
        assert_eq!(
            state.advance_payment(payment.id, PaymentStage::CardActive),
            Err(PaymentError::InvalidTransition {
                from: PaymentStage::Processing,
                to: PaymentStage::CardActive,
            })
        );
    }
}
