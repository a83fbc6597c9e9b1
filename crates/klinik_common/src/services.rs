//! Service abstractions for external collaborators.
//!
//! The booking core only talks to the spreadsheet and the mail transport through
//! these traits, so both can be swapped for in-memory or mocked implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

// --- Spreadsheet store ---

/// One spreadsheet row as returned by the values API.
pub type Row = Vec<serde_json::Value>;

/// Errors raised by a [`SheetStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Spreadsheet API error during {operation}: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },
    #[error("Worksheet not found: {0}")]
    MissingSheet(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Spreadsheet authentication failed: {0}")]
    Auth(String),
}

impl StoreError {
    pub fn api(operation: &'static str, message: impl fmt::Display) -> Self {
        StoreError::Api {
            operation,
            message: message.to_string(),
        }
    }
}

/// A remote tabular store addressed with A1 notation (`sheet!A:E`, `sheet!E12`).
///
/// No operation is transactional; callers that need read-then-write consistency
/// must serialize themselves.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Reads every row of the range. Trailing empty cells may be omitted.
    async fn read_range(&self, range: &str) -> Result<Vec<Row>, StoreError>;

    /// Appends rows after the last non-empty row of the range's sheet.
    async fn append_rows(&self, range: &str, rows: Vec<Row>) -> Result<(), StoreError>;

    /// Overwrites the cells starting at the range's top-left corner.
    async fn update_range(&self, range: &str, rows: Vec<Row>) -> Result<(), StoreError>;

    /// Deletes whole rows by 1-based row number.
    async fn delete_rows(&self, sheet: &str, row_numbers: &[u32]) -> Result<(), StoreError>;

    async fn sheet_exists(&self, sheet: &str) -> Result<bool, StoreError>;

    /// Creates the worksheet and writes `headers` into row 1.
    async fn create_sheet(&self, sheet: &str, headers: &[&str]) -> Result<(), StoreError>;
}

/// Creates `sheet` with `headers` unless it already exists.
///
/// Returns `true` when the sheet was created by this call.
pub async fn ensure_sheet(
    store: &dyn SheetStore,
    sheet: &str,
    headers: &[&str],
) -> Result<bool, StoreError> {
    if store.sheet_exists(sheet).await? {
        return Ok(false);
    }
    info!("Creating worksheet '{}'", sheet);
    store.create_sheet(sheet, headers).await?;
    Ok(true)
}

// --- Notification ---

/// An inline image referenced from the HTML body as `cid:<content_id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineImage {
    pub content_id: String,
    pub filename: String,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// A rendered e-mail ready for the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    pub inline_image: Option<InlineImage>,
}

/// Represents the result of a notification operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    /// The ID of the notification.
    pub id: String,
    /// The status of the notification.
    pub status: String,
}

/// A trait for notification service operations.
pub trait NotificationService: Send + Sync {
    /// Error type returned by notification service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send one e-mail.
    fn send_email(&self, email: OutgoingEmail) -> BoxFuture<'_, NotificationResult, Self::Error>;
}

/// Erases the concrete error type of a [`NotificationService`].
pub struct BoxedNotifier<N>(pub N);

impl<N: NotificationService> NotificationService for BoxedNotifier<N> {
    type Error = BoxedError;

    fn send_email(&self, email: OutgoingEmail) -> BoxFuture<'_, NotificationResult, Self::Error> {
        Box::pin(async move {
            self.0
                .send_email(email)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}

pub type DynNotifier = Arc<dyn NotificationService<Error = BoxedError>>;

/// A factory for the collaborators the booking routes need.
pub trait ServiceFactory: Send + Sync {
    fn sheet_store(&self) -> Arc<dyn SheetStore>;

    fn notification_service(&self) -> Option<DynNotifier>;
}
