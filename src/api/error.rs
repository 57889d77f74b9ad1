//! HTTP mapping for [`Error`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::error::Error;

impl Error {
    /// - Validation: 400 Bad Request
    /// - NotFound: 404 Not Found
    /// - Conflict and State: 409 Conflict
    /// - Store: 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::State { .. } => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Validation { message, .. }
            | Self::Conflict { message, .. }
            | Self::State { message, .. } => message.clone(),
            Self::NotFound { .. } => self.to_string(),
            // Store failures never reach the client in detail.
            Self::Store(e) => {
                error!(error = %e, "store failure");
                "internal server error".to_string()
            }
        };
        let body = json!({
            "error": self.kind(),
            "field": self.field(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            Error::validation("targets", "x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::not_found("cat", 1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::conflict("cat", "x").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::state("completed", "x").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::from(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_failure_response_keeps_status() {
        let response = Error::from(anyhow::anyhow!("secret database path")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
