// File: crates/services/klinik_backend/src/main.rs
mod service_factory;

use axum::{routing::get, Router};
use klinik_booking::events::EventPublisher;
use klinik_booking::notifier::{spawn_notifier, MailSettings};
use klinik_booking::{routes as booking_routes, KlinikState};
use klinik_common::{logging, Context};
use klinik_common::services::ServiceFactory;
use klinik_config::load_config;
use service_factory::KlinikServiceFactory;
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = Arc::new(load_config().context("Failed to load config")?);
    let _log_guard = logging::init_from_config(config.logging.as_ref());

    let factory = KlinikServiceFactory::new(&config).await?;

    let (events, receiver) = EventPublisher::channel();
    if let Some(notifier) = factory.notification_service() {
        spawn_notifier(
            receiver,
            notifier,
            MailSettings::from_config(config.gmail.as_ref()),
        );
    }

    let state = Arc::new(KlinikState::new(
        config.clone(),
        factory.sheet_store(),
        events,
    ));

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Klinik booking API!" }))
        .merge(booking_routes::routes(state));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use klinik_booking::doc::KlinikApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Klinik API",
                version = "0.1.0",
                description = "Appointment availability and booking",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            components(),
            tags( (name = "Klinik", description = "Booking actions")),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(KlinikApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server at http://{}", addr);
    info!("Booking endpoint available at http://{}/api/klinik", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
