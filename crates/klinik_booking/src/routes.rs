// --- File: crates/klinik_booking/src/routes.rs ---

use crate::handlers::{action_handler, health_handler, KlinikState};
use axum::{routing::get, Router};
use http::{header, HeaderName, HeaderValue};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;

/// Router for the action endpoint. Mounted under `/api` by the backend.
///
/// Availability changes with every booking, so no response may be cached.
pub fn routes(state: Arc<KlinikState>) -> Router {
    Router::new()
        .route("/klinik", get(health_handler).post(action_handler))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("surrogate-control"),
            HeaderValue::from_static("no-store"),
        ))
}
