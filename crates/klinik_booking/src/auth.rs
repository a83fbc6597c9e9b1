// File: crates/klinik_booking/src/auth.rs
use google_sheets4::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{
        authorized_user::AuthorizedUserSecret, read_service_account_key,
        AuthorizedUserAuthenticator, ServiceAccountAuthenticator, ServiceAccountKey,
    },
    Sheets,
};
use klinik_config::SheetsConfig;
use std::{error::Error, path::Path};
use tracing::info;

type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = Sheets<Connector>;

enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUserSecret),
}

/// A service account key file wins when both credential kinds are configured.
async fn resolve_credentials(
    config: &SheetsConfig,
) -> Result<Credentials, Box<dyn Error + Send + Sync>> {
    if let Some(key_path) = config.key_path.as_deref() {
        let key = read_service_account_key(Path::new(key_path)).await?;
        return Ok(Credentials::ServiceAccount(key));
    }

    Ok(Credentials::AuthorizedUser(AuthorizedUserSecret {
        client_id: config
            .client_id
            .clone()
            .ok_or("Missing sheets.client_id (or sheets.key_path)")?,
        client_secret: config
            .client_secret
            .clone()
            .ok_or("Missing sheets.client_secret")?,
        refresh_token: config
            .refresh_token
            .clone()
            .ok_or("Missing sheets.refresh_token")?,
        key_type: "authorized_user".to_string(),
    }))
}

/// Builds an authenticated Sheets hub.
pub async fn create_sheets_hub(
    config: &SheetsConfig,
) -> Result<HubType, Box<dyn Error + Send + Sync>> {
    let credentials = resolve_credentials(config).await?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build();
    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    let hub = match credentials {
        Credentials::ServiceAccount(key) => {
            let auth = ServiceAccountAuthenticator::builder(key).build().await?;
            info!("Sheets client authenticated with a service account key");
            Sheets::new(client, auth)
        }
        Credentials::AuthorizedUser(secret) => {
            let auth = AuthorizedUserAuthenticator::builder(secret).build().await?;
            info!("Sheets client authenticated with an OAuth refresh token");
            Sheets::new(client, auth)
        }
    };

    Ok(hub)
}
