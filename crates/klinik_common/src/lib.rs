// --- File: crates/klinik_common/src/lib.rs ---

pub mod error; // Error handling
pub mod features; // Runtime feature flags
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod services; // Collaborator abstractions

pub use error::{config_error, Context, HttpStatusCode, KlinikError};

pub use http::{client::HTTP_CLIENT, IntoHttpResponse};

pub use features::{is_feature_enabled, is_gmail_enabled, is_sheets_enabled};
