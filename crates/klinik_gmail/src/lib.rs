// --- File: crates/klinik_gmail/src/lib.rs ---
pub mod auth;
pub mod error;
pub mod mime;
pub mod service;

pub use error::GmailError;
pub use service::GmailNotificationService;
