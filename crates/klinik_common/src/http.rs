use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::error::{HttpStatusCode, KlinikError};

// Include the client module
pub mod client;

/// Extension trait for KlinikError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for KlinikError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Same envelope as a rejected action, so clients branch on `success` only.
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }));

        (status_code, body).into_response()
    }
}

impl IntoResponse for KlinikError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_become_bad_requests() {
        let response = KlinikError::ParseError("expected value".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_become_500() {
        let response = KlinikError::InternalError("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
