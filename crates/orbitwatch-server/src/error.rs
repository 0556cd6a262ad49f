//! Mapping of domain errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orbitwatch_core::Error;
use tracing::error;

/// Wrapper so handlers can return `Result<_, ApiError>` and use `?`.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            Error::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "message": msg }),
            ),
            Error::RefreshInProgress => (
                StatusCode::CONFLICT,
                serde_json::json!({ "status": "busy", "message": self.0.to_string() }),
            ),
            Error::Propagation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "message": format!("Computation failed: {}", msg) }),
            ),
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "status": "error", "message": other.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::RefreshInProgress, StatusCode::CONFLICT),
            (Error::Propagation("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).into_response().status(), status);
        }
    }
}
