// --- File: crates/services/klinik_backend/src/service_factory.rs ---
//! Picks the spreadsheet and mail collaborators from the runtime flags.
use klinik_booking::auth::create_sheets_hub;
use klinik_booking::notifier::LoggingNotificationService;
use klinik_booking::{GoogleSheetsStore, MemorySheetStore};
use klinik_common::services::{BoxedNotifier, DynNotifier, ServiceFactory, SheetStore};
use klinik_common::{config_error, is_gmail_enabled, is_sheets_enabled, KlinikError};
use klinik_config::AppConfig;
use klinik_gmail::GmailNotificationService;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct KlinikServiceFactory {
    sheet_store: Arc<dyn SheetStore>,
    notification_service: DynNotifier,
}

impl KlinikServiceFactory {
    /// Fails when Sheets is enabled but cannot be reached; a missing mail
    /// transport only downgrades notifications to log lines.
    pub async fn new(config: &AppConfig) -> Result<Self, KlinikError> {
        let sheet_store: Arc<dyn SheetStore> = match config.sheets.as_ref() {
            Some(sheets) if is_sheets_enabled(config) => {
                info!("Initializing Google Sheets store...");
                let hub = create_sheets_hub(sheets)
                    .await
                    .map_err(|e| config_error(format!("Google Sheets: {}", e)))?;
                Arc::new(GoogleSheetsStore::new(
                    Arc::new(hub),
                    sheets.spreadsheet_id.clone(),
                ))
            }
            _ => {
                warn!("Sheets disabled: bookings are kept in memory and lost on restart");
                Arc::new(MemorySheetStore::new())
            }
        };

        let notification_service = Self::notifier(config);
        Ok(Self {
            sheet_store,
            notification_service,
        })
    }

    fn notifier(config: &AppConfig) -> DynNotifier {
        if let Some(gmail) = config.gmail.as_ref().filter(|_| is_gmail_enabled(config)) {
            match GmailNotificationService::from_config(gmail) {
                Ok(service) => {
                    info!("Gmail notifications enabled");
                    return Arc::new(BoxedNotifier(service));
                }
                Err(e) => error!("Gmail disabled: {}", e),
            }
        }
        Arc::new(BoxedNotifier(LoggingNotificationService))
    }
}

impl ServiceFactory for KlinikServiceFactory {
    fn sheet_store(&self) -> Arc<dyn SheetStore> {
        self.sheet_store.clone()
    }

    fn notification_service(&self) -> Option<DynNotifier> {
        Some(self.notification_service.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klinik_config::GmailConfig;

    #[tokio::test]
    async fn test_local_config_uses_memory_and_logging() {
        let factory = KlinikServiceFactory::new(&AppConfig::local(8080)).await.unwrap();
        assert!(!factory.sheet_store().sheet_exists("time_slots").await.unwrap());
        assert!(factory.notification_service().is_some());
    }

    #[tokio::test]
    async fn test_incomplete_gmail_falls_back_to_logging() {
        let mut config = AppConfig::local(8080);
        config.use_gmail = true;
        config.gmail = Some(GmailConfig::default());
        let factory = KlinikServiceFactory::new(&config).await.unwrap();
        assert!(factory.notification_service().is_some());
    }

    #[tokio::test]
    async fn test_sheets_without_credentials_fails_startup() {
        let mut config = AppConfig::local(8080);
        config.use_sheets = true;
        config.sheets = Some(Default::default());
        let err = KlinikServiceFactory::new(&config).await.err().unwrap();
        assert!(err.to_string().contains("Missing sheets.client_id"));
    }
}
