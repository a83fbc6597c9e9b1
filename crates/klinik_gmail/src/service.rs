use crate::auth::{AccessTokenSource, RefreshTokenSource};
use crate::error::GmailError;
use crate::mime::{build_mime, encode_raw};
use klinik_common::services::{BoxFuture, NotificationResult, NotificationService, OutgoingEmail};
use klinik_common::HTTP_CLIENT;
use klinik_config::GmailConfig;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com";

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Sends notifications through `users.messages.send` of the configured mailbox.
pub struct GmailNotificationService {
    client: Client,
    tokens: Arc<dyn AccessTokenSource>,
    api_base: String,
}

impl GmailNotificationService {
    pub fn new(client: Client, tokens: Arc<dyn AccessTokenSource>, api_base: &str) -> Self {
        Self {
            client,
            tokens,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &GmailConfig) -> Result<Self, GmailError> {
        let tokens = RefreshTokenSource::from_config(config)?;
        Ok(Self::new(
            HTTP_CLIENT.clone(),
            Arc::new(tokens),
            config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
        ))
    }

    pub async fn send(&self, email: OutgoingEmail) -> Result<NotificationResult, GmailError> {
        let url = format!("{}/gmail/v1/users/me/messages/send", self.api_base);
        let boundary = uuid::Uuid::new_v4().simple().to_string();
        let raw = encode_raw(&build_mime(&email, &boundary));

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .json(&json!({ "raw": raw }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Gmail returned {}: {}", status, message);
            return Err(GmailError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let sent: SendResponse = response.json().await?;
        info!("Mail '{}' sent to {} as {}", email.subject, email.to, sent.id);
        Ok(NotificationResult {
            id: sent.id,
            status: "sent".to_string(),
        })
    }
}

impl NotificationService for GmailNotificationService {
    type Error = GmailError;

    fn send_email(&self, email: OutgoingEmail) -> BoxFuture<'_, NotificationResult, Self::Error> {
        Box::pin(self.send(email))
    }
}
