// --- File: crates/klinik_booking/src/error.rs ---
use klinik_common::services::StoreError;
use thiserror::Error;

/// Every way a booking action can be answered with `success: false`.
///
/// The display strings are what the website shows; [`BookingError::code`] is the
/// stable identifier clients should branch on.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid AU phone number")]
    InvalidPhone,
    #[error("{0}")]
    InvalidParameter(String),
    #[error("Appointments must be booked at least 24 hours in advance. Please select a later date and time.")]
    BookingTooSoon,
    #[error("Appointments must be booked at least 24 hours in advance.")]
    DayTooSoon,
    #[error("Time slot not found")]
    SlotNotFound,
    #[error("This time slot is no longer available. Please select another time.")]
    SlotUnavailable,
    #[error("Appointment not found")]
    AppointmentNotFound,
    #[error("Appointment is already cancelled")]
    AlreadyCancelled,
    #[error("Invalid action. Supported: {0}")]
    UnknownAction(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::MissingField(_) => "MISSING_FIELD",
            BookingError::InvalidEmail => "INVALID_EMAIL",
            BookingError::InvalidPhone => "INVALID_PHONE",
            BookingError::InvalidParameter(_) => "INVALID_PARAMETER",
            BookingError::BookingTooSoon | BookingError::DayTooSoon => "LEAD_TIME",
            BookingError::SlotNotFound => "SLOT_NOT_FOUND",
            BookingError::SlotUnavailable => "SLOT_UNAVAILABLE",
            BookingError::AppointmentNotFound => "APPOINTMENT_NOT_FOUND",
            BookingError::AlreadyCancelled => "ALREADY_CANCELLED",
            BookingError::UnknownAction(_) => "UNKNOWN_ACTION",
            BookingError::Store(_) => "STORE_ERROR",
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        BookingError::InvalidParameter(message.into())
    }
}
