//! An issued virtual card and the countdown that bounds it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    services::{copy_all_text, format_card_number, CardDetails, Platform},
    timer::{CardLifecycleTimer, CountdownSnapshot, ExpiryEvent, TickTrigger},
};
use super::{Payment, PaymentStage, Route};

/// Sent by a card's timer when its budget runs out
#[derive(Debug, Clone, PartialEq)]
pub struct CardExpired {
    pub card_id: Uuid,
    pub payment_id: Uuid,
    pub event: ExpiryEvent,
}

/// One card per payment. The session owns its timer, so dropping the
/// session releases the trigger.
pub struct CardSession<T: TickTrigger> {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub details: CardDetails,
    pub issued_at: DateTime<Utc>,
    timer: CardLifecycleTimer<T>,
}

impl<T: TickTrigger> CardSession<T> {
    pub fn new(id: Uuid, payment_id: Uuid, timer: CardLifecycleTimer<T>) -> Self {
        Self {
            id,
            payment_id,
            details: CardDetails::mock(),
            issued_at: Utc::now(),
            timer,
        }
    }

    /// Start counting down
    pub fn activate(&mut self) {
        self.timer.activate();
    }

    /// Stop the countdown where it is
    pub fn release(&mut self) {
        self.timer.cancel();
    }

    pub fn is_expired(&self) -> bool {
        self.timer.is_expired()
    }

    pub fn countdown(&self) -> CountdownSnapshot {
        self.timer.snapshot()
    }
}

/// What the card-activation screen renders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardView {
    pub card_id: Uuid,
    pub payment_id: Uuid,
    pub platform: Platform,
    /// Card number grouped in blocks of four
    pub number: String,
    pub expiry: String,
    pub cvv: String,
    pub active: bool,
    pub copy_all: String,
    pub refund_inr: f64,
    pub issued_at: DateTime<Utc>,
    pub countdown: CountdownSnapshot,
    pub stage: PaymentStage,
    pub next: Route,
}

impl<T: TickTrigger> CardSession<T> {
    pub fn view(&self, payment: &Payment) -> CardView {
        let countdown = self.countdown();
        CardView {
            card_id: self.id,
            payment_id: self.payment_id,
            platform: payment.platform.clone(),
            number: format_card_number(&self.details.number),
            expiry: self.details.expiry.clone(),
            cvv: self.details.cvv.clone(),
            active: payment.stage == PaymentStage::CardActive && !countdown.expired,
            copy_all: copy_all_text(&self.details),
            refund_inr: payment.inr_amount,
            issued_at: self.issued_at,
            countdown,
            stage: payment.stage,
            next: payment.stage.route(),
        }
    }
}
