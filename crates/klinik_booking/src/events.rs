// --- File: crates/klinik_booking/src/events.rs ---
use serde::Serialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// A confirmed booking, as the operator e-mail presents it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingNotice {
    pub appointment_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub concern: String,
    pub message: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeNotice {
    pub reference: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub concerns: Vec<String>,
    pub enquiries: String,
    pub is_first_time: bool,
    pub duration_minutes: Option<u32>,
    pub deposit_required: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    BookingCreated(BookingNotice),
    IntakeSubmitted(IntakeNotice),
}

impl DomainEvent {
    pub fn reference(&self) -> &str {
        match self {
            DomainEvent::BookingCreated(n) => &n.appointment_id,
            DomainEvent::IntakeSubmitted(n) => &n.reference,
        }
    }
}

/// Sending half of the notification channel. Publishing never fails the caller.
#[derive(Clone, Debug, Default)]
pub struct EventPublisher {
    tx: Option<UnboundedSender<DomainEvent>>,
}

impl EventPublisher {
    pub fn channel() -> (Self, UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A publisher that drops every event.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn publish(&self, event: DomainEvent) {
        let Some(tx) = &self.tx else {
            debug!("Notifications disabled, dropping event {}", event.reference());
            return;
        };
        if let Err(err) = tx.send(event) {
            warn!(
                "Notifier is gone, event {} was not delivered",
                err.0.reference()
            );
        }
    }
}
