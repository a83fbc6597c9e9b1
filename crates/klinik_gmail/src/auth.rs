//! Access tokens for the Gmail send endpoint.
//!
//! The clinic mailbox is authorized once with an OAuth consent flow; the
//! resulting refresh token is exchanged for short-lived access tokens here.

use crate::error::GmailError;
use async_trait::async_trait;
use klinik_config::GmailConfig;
use tokio::sync::OnceCell;
use tracing::debug;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::authorized_user::AuthorizedUserSecret;
use yup_oauth2::AuthorizedUserAuthenticator;

pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, GmailError>;
}

/// A fixed bearer token, for tests and short-lived tooling.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, GmailError> {
        Ok(self.0.clone())
    }
}

/// Exchanges the mailbox's refresh token; yup-oauth2 caches and renews the result.
pub struct RefreshTokenSource {
    secret: AuthorizedUserSecret,
    authenticator: OnceCell<DefaultAuthenticator>,
}

impl RefreshTokenSource {
    pub fn from_config(config: &GmailConfig) -> Result<Self, GmailError> {
        let required = |value: &str, name: &str| {
            if value.trim().is_empty() {
                Err(GmailError::ConfigError(format!("Missing gmail.{}", name)))
            } else {
                Ok(value.to_string())
            }
        };
        Ok(Self {
            secret: AuthorizedUserSecret {
                client_id: required(&config.client_id, "client_id")?,
                client_secret: required(&config.client_secret, "client_secret")?,
                refresh_token: required(&config.refresh_token, "refresh_token")?,
                key_type: "authorized_user".to_string(),
            },
            authenticator: OnceCell::new(),
        })
    }
}

#[async_trait]
impl AccessTokenSource for RefreshTokenSource {
    async fn access_token(&self) -> Result<String, GmailError> {
        let auth = self
            .authenticator
            .get_or_try_init(|| async {
                debug!("Building Gmail authenticator");
                AuthorizedUserAuthenticator::builder(self.secret.clone())
                    .build()
                    .await
            })
            .await
            .map_err(|e| GmailError::AuthError(e.to_string()))?;

        let token = auth
            .token(&[GMAIL_SEND_SCOPE])
            .await
            .map_err(|e| GmailError::AuthError(e.to_string()))?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| GmailError::AuthError("No token available".to_string()))
    }
}
