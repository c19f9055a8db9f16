use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use libsyndicate::SyndicateError;
use serde_json::json;

/// Error returned by every handler
///
/// Rendered as `{"success": false, "error": "..."}` with the status code the
/// library assigns to the underlying error.
#[derive(Debug)]
pub struct AppError(SyndicateError);

impl From<SyndicateError> for AppError {
    fn from(err: SyndicateError) -> Self {
        AppError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(SyndicateError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("{}", self.0);
        } else {
            tracing::debug!("Request failed: {}", self.0);
        }

        (
            status,
            Json(json!({ "success": false, "error": self.0.to_string() })),
        )
            .into_response()
    }
}
