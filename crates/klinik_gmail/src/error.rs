use thiserror::Error;

/// Gmail transport failures. None of them fail the action that triggered the mail.
#[derive(Error, Debug)]
pub enum GmailError {
    #[error("Gmail authentication error: {0}")]
    AuthError(String),

    #[error("Gmail API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Gmail API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Gmail configuration missing or incomplete: {0}")]
    ConfigError(String),
}
