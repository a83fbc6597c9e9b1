// --- File: crates/klinik_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Google Sheets Config ---
// Either a service account key file or an OAuth client + refresh token.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub key_path: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>, // usually "secret_from_env" -> SHEETS_REFRESH_TOKEN
}

impl SheetsConfig {
    pub fn has_credentials(&self) -> bool {
        self.key_path.is_some()
            || (self.client_id.is_some()
                && self.client_secret.is_some()
                && self.refresh_token.is_some())
    }
}

// --- Gmail Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GmailConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Mailbox the messages are sent from.
    pub user: String,
    /// Operator address receiving booking notifications.
    pub mail_to: Option<String>,
    pub mail_from: Option<String>,
    /// PNG embedded inline as `cid:logo@klinikka`.
    pub logo_path: Option<String>,
    /// Override for the Gmail REST endpoint, e.g. in tests.
    pub api_base: Option<String>,
}

// --- Booking rules ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BookingConfig {
    /// IANA zone the sheet's wall-clock dates are read in. Defaults to Australia/Sydney.
    pub time_zone: Option<String>,
    pub open_time: Option<String>,  // "10:00"
    pub close_time: Option<String>, // "18:00"
    pub lead_time_hours: Option<i64>,
    /// Serialize bookings per slot inside this process. Defaults to true.
    pub serialize_bookings: Option<bool>,
    pub default_weeks: Option<u32>,
}

// --- Logging ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
    pub file_prefix: Option<String>,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_sheets: bool,
    #[serde(default)]
    pub use_gmail: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub sheets: Option<SheetsConfig>,
    #[serde(default)]
    pub gmail: Option<GmailConfig>,
    #[serde(default)]
    pub booking: Option<BookingConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl AppConfig {
    /// Minimal configuration used by tests and local runs without a config file.
    pub fn local(port: u16) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port,
            },
            use_sheets: false,
            use_gmail: false,
            sheets: None,
            gmail: None,
            booking: None,
            logging: None,
        }
    }
}
