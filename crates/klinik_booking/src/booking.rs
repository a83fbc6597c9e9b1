// --- File: crates/klinik_booking/src/booking.rs ---
//! The only writer of `time_slots` counters and `bookings` rows.

use crate::availability::AvailabilityRules;
use crate::calendar::load_slots;
use crate::error::BookingError;
use crate::events::{BookingNotice, DomainEvent, EventPublisher};
use crate::locks::SlotLocks;
use crate::models::BookingRequest;
use crate::normalize::{
    cell_text, clean_time_label, parse_clock_time, parse_date, parse_time_range, Slot, SlotKey,
};
use crate::table::{
    Table, BOOKING_STATUS_COLUMN, BOOKING_UPDATED_COLUMN, SLOT_AVAILABLE_COLUMN,
    SLOT_BOOKINGS_COLUMN,
};
use crate::validation::{check_email, required};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use klinik_common::services::{ensure_sheet, Row, SheetStore, StoreError};
use klinik_config::BookingConfig;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CANCELLED: &str = "cancelled";

/// Steps of one booking attempt, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStage {
    ValidateInput,
    ValidateLeadTime,
    AcquireSlotLock,
    ReloadSlot,
    CheckCapacity,
    AppendBookingRow,
    UpdateCounter,
    UpdateFlag,
    PublishEvent,
    Done,
}

/// `prefix` followed by eight upper-case alphanumerics, e.g. `APT_3F9A12BC`.
pub fn new_reference(prefix: &str) -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, simple[..8].to_uppercase())
}

pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookingConfirmation {
    #[cfg_attr(feature = "openapi", schema(example = "APT_3F9A12BC"))]
    pub appointment_id: String,
    pub message: String,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CancellationResult {
    pub message: String,
    /// False when the booking's slot row could not be found.
    pub slot_released: bool,
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Finds the slot row for a submitted date and label: exact cleaned label first,
/// then the same date and start time.
pub fn locate_slot<'a>(slots: &'a [Slot], date: NaiveDate, time_label: &str) -> Option<&'a Slot> {
    let wanted_date = format_date(date);
    let wanted_label = clean_time_label(time_label);
    slots
        .iter()
        .find(|s| s.date == wanted_date && clean_time_label(&s.time_slot) == wanted_label)
        .or_else(|| {
            let start = parse_clock_time(&parse_time_range(time_label).start)?;
            let key = SlotKey::new(date, start);
            slots.iter().find(|s| s.key() == Some(key))
        })
}

pub struct BookingCoordinator {
    store: Arc<dyn SheetStore>,
    locks: Option<SlotLocks>,
    events: EventPublisher,
    rules: AvailabilityRules,
}

impl BookingCoordinator {
    pub fn new(store: Arc<dyn SheetStore>, rules: AvailabilityRules, events: EventPublisher) -> Self {
        Self {
            store,
            locks: Some(SlotLocks::new()),
            events,
            rules,
        }
    }

    /// Applies `booking.serialize_bookings` (default on).
    pub fn from_config(
        store: Arc<dyn SheetStore>,
        config: Option<&BookingConfig>,
        events: EventPublisher,
    ) -> Self {
        let coordinator = Self::new(store, AvailabilityRules::from_config(config), events);
        match config.and_then(|c| c.serialize_bookings) {
            Some(false) => {
                warn!("booking.serialize_bookings is off: concurrent bookings may overbook a slot");
                coordinator.without_locks()
            }
            _ => coordinator,
        }
    }

    /// Drops per-slot serialization. Concurrent bookings can then overbook.
    pub fn without_locks(mut self) -> Self {
        self.locks = None;
        self
    }

    pub fn rules(&self) -> &AvailabilityRules {
        &self.rules
    }

    /// Start time a booking locks on; labels without one fall back to opening time.
    fn slot_start(&self, time_label: &str) -> NaiveTime {
        parse_clock_time(&parse_time_range(time_label).start).unwrap_or(self.rules.open)
    }

    async fn lock(&self, key: SlotKey) -> Option<OwnedMutexGuard<()>> {
        match &self.locks {
            Some(locks) => Some(locks.acquire(key).await),
            None => None,
        }
    }

    async fn write_cell(&self, table: Table, column: char, row: u32, value: Value) -> Result<(), StoreError> {
        self.store
            .update_range(&table.cell(column, row), vec![vec![value]])
            .await
    }

    pub async fn book(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingConfirmation, BookingError> {
        let mut stage = BookingStage::ValidateInput;
        let name = required(request.customer_name.as_deref(), "customer_name")?;
        let email = required(request.customer_email.as_deref(), "customer_email")?;
        let phone = required(request.customer_phone.as_deref(), "customer_phone")?;
        let date_raw = required(request.appointment_date.as_deref(), "appointment_date")?;
        let time_raw = required(request.appointment_time.as_deref(), "appointment_time")?;
        let concern = required(request.concern.as_deref(), "concern")?;
        check_email(email)?;
        let message = request.message.as_deref().unwrap_or("").trim();

        stage = advance(stage, BookingStage::ValidateLeadTime);
        let date = parse_date(date_raw).ok_or_else(|| {
            BookingError::invalid(format!("Invalid appointment_date: {}", date_raw))
        })?;
        let start = self.slot_start(time_raw);
        let starts_at = self.rules.local_instant(date, start).ok_or_else(|| {
            BookingError::invalid(format!("Invalid appointment time: {} {}", date_raw, time_raw))
        })?;
        if starts_at < self.rules.earliest_start(now) {
            info!("Booking for {} {} rejected: inside lead time", date_raw, time_raw);
            return Err(BookingError::BookingTooSoon);
        }

        stage = advance(stage, BookingStage::AcquireSlotLock);
        let key = SlotKey::new(date, start);
        let _guard = self.lock(key).await;

        stage = advance(stage, BookingStage::ReloadSlot);
        let slots = load_slots(self.store.as_ref()).await?;
        let slot = locate_slot(&slots, date, time_raw).ok_or_else(|| {
            info!("Booking for {} {} rejected: slot not found", date_raw, time_raw);
            BookingError::SlotNotFound
        })?;

        stage = advance(stage, BookingStage::CheckCapacity);
        let (max, current) = match (slot.max_capacity, slot.current_bookings) {
            (Some(max), Some(current)) if max > 0 && current < max => (max, current),
            _ => {
                info!(
                    "Booking for {} rejected: row {} has no capacity left ({:?}/{:?})",
                    key, slot.row_number, slot.current_bookings, slot.max_capacity
                );
                return Err(BookingError::SlotUnavailable);
            }
        };
        let row_number = slot.row_number;

        stage = advance(stage, BookingStage::AppendBookingRow);
        ensure_sheet(self.store.as_ref(), Table::Bookings.name(), Table::Bookings.headers()).await?;
        let appointment_id = new_reference("APT_");
        let created_at = timestamp(now);
        let booking_row: Row = vec![
            json!(appointment_id),
            json!(name),
            json!(email),
            json!(phone),
            json!(date_raw),
            json!(time_raw),
            json!(STATUS_PENDING),
            json!(concern),
            json!(message),
            json!(created_at),
            json!(created_at),
        ];
        self.store
            .append_rows(&Table::Bookings.full_range(), vec![booking_row])
            .await?;

        stage = advance(stage, BookingStage::UpdateCounter);
        let new_count = current + 1;
        if let Err(err) = self
            .write_cell(Table::TimeSlots, SLOT_BOOKINGS_COLUMN, row_number, json!(new_count))
            .await
        {
            error!(
                "Partial write for {}: booking row appended, failed at {:?}: {}",
                appointment_id, stage, err
            );
            return Err(err.into());
        }

        if new_count >= max {
            stage = advance(stage, BookingStage::UpdateFlag);
            if let Err(err) = self
                .write_cell(Table::TimeSlots, SLOT_AVAILABLE_COLUMN, row_number, json!("FALSE"))
                .await
            {
                error!(
                    "Partial write for {}: counter updated, failed at {:?}: {}",
                    appointment_id, stage, err
                );
                return Err(err.into());
            }
        }

        stage = advance(stage, BookingStage::PublishEvent);
        self.events.publish(DomainEvent::BookingCreated(BookingNotice {
            appointment_id: appointment_id.clone(),
            customer_name: name.to_string(),
            customer_email: email.to_string(),
            customer_phone: phone.to_string(),
            appointment_date: date_raw.to_string(),
            appointment_time: time_raw.to_string(),
            concern: concern.to_string(),
            message: message.to_string(),
            created_at,
        }));

        advance(stage, BookingStage::Done);
        info!(
            "Booked {} for {} (row {}, {}/{})",
            appointment_id, key, row_number, new_count, max
        );
        Ok(BookingConfirmation {
            appointment_id,
            message: "Appointment booked successfully".to_string(),
        })
    }

    async fn find_booking(&self, appointment_id: &str) -> Result<(u32, Row), BookingError> {
        let rows = self.store.read_range(&Table::Bookings.full_range()).await?;
        rows.into_iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| row.first().map(cell_text).as_deref() == Some(appointment_id))
            .map(|(index, row)| (index as u32 + 1, row))
            .ok_or(BookingError::AppointmentNotFound)
    }

    pub async fn cancel(
        &self,
        appointment_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CancellationResult, BookingError> {
        let appointment_id = required(appointment_id, "appointment_id")?;
        ensure_sheet(self.store.as_ref(), Table::Bookings.name(), Table::Bookings.headers()).await?;

        let (_, first_read) = self.find_booking(appointment_id).await?;
        let booking_date = first_read.get(4).map(cell_text).unwrap_or_default();
        let booking_time = first_read.get(5).map(cell_text).unwrap_or_default();
        // Same lock key as the booking took
        let date = parse_date(&booking_date);
        let _guard = match date {
            Some(date) => self.lock(SlotKey::new(date, self.slot_start(&booking_time))).await,
            None => None,
        };

        // Re-read under the lock so two cancellations cannot both release a seat
        let (row_number, booking) = self.find_booking(appointment_id).await?;
        let status = booking.get(6).map(cell_text).unwrap_or_default();
        if status.trim().eq_ignore_ascii_case(STATUS_CANCELLED) {
            info!("Cancellation of {} rejected: already cancelled", appointment_id);
            return Err(BookingError::AlreadyCancelled);
        }

        self.write_cell(Table::Bookings, BOOKING_STATUS_COLUMN, row_number, json!(STATUS_CANCELLED))
            .await?;
        self.write_cell(Table::Bookings, BOOKING_UPDATED_COLUMN, row_number, json!(timestamp(now)))
            .await?;

        let slot_released = match date {
            Some(date) => self.release_seat(appointment_id, date, &booking_time).await?,
            None => {
                warn!(
                    "Booking {} has unparseable date '{}', no seat released",
                    appointment_id, booking_date
                );
                false
            }
        };

        info!("Cancelled {} (slot released: {})", appointment_id, slot_released);
        Ok(CancellationResult {
            message: "Appointment cancelled successfully".to_string(),
            slot_released,
        })
    }

    /// Gives back the seat of the row `book` would have picked for this date and label.
    async fn release_seat(
        &self,
        appointment_id: &str,
        date: NaiveDate,
        time_label: &str,
    ) -> Result<bool, BookingError> {
        let slots = load_slots(self.store.as_ref()).await?;
        let Some(slot) = locate_slot(&slots, date, time_label) else {
            warn!(
                "Slot {} {} of cancelled booking {} not found",
                format_date(date),
                time_label,
                appointment_id
            );
            return Ok(false);
        };

        let current = slot.current_bookings.unwrap_or(0);
        let new_count = current.saturating_sub(1);
        if let Err(err) = self
            .write_cell(Table::TimeSlots, SLOT_BOOKINGS_COLUMN, slot.row_number, json!(new_count))
            .await
        {
            error!(
                "Partial write for {}: booking cancelled but counter not decremented: {}",
                appointment_id, err
            );
            return Err(err.into());
        }

        if let Some(max) = slot.max_capacity.filter(|m| *m > 0) {
            if current >= max && new_count < max {
                if let Err(err) = self
                    .write_cell(Table::TimeSlots, SLOT_AVAILABLE_COLUMN, slot.row_number, json!("TRUE"))
                    .await
                {
                    error!(
                        "Partial write for {}: counter decremented but slot not reopened: {}",
                        appointment_id, err
                    );
                    return Err(err.into());
                }
            }
        }
        Ok(true)
    }
}

fn advance(from: BookingStage, to: BookingStage) -> BookingStage {
    debug!("Booking stage {:?} -> {:?}", from, to);
    to
}
