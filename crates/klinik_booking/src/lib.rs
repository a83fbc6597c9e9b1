// --- File: crates/klinik_booking/src/lib.rs ---
pub mod auth;
#[cfg(test)]
mod auth_test;
pub mod availability;
#[cfg(test)]
mod availability_proptest;
pub mod booking;
#[cfg(test)]
mod booking_test;
pub mod calendar;
#[cfg(test)]
mod calendar_test;
pub mod doc;
pub mod error;
pub mod events;
pub mod forms;
pub mod generator;
pub mod handlers;
pub mod holidays;
#[cfg(test)]
mod holidays_test;
pub mod locks;
pub mod memory;
pub mod models;
pub mod normalize;
#[cfg(test)]
mod normalize_proptest;
pub mod notifier;
pub mod routes;
pub mod service;
pub mod table;
pub mod validation;

pub use error::BookingError;
pub use handlers::KlinikState;
pub use memory::MemorySheetStore;
pub use service::GoogleSheetsStore;
