// HTTP rendering of `VortexError`: every failure becomes `{ "error": message }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::api::types::ErrorBody;
use crate::error::VortexError;

impl IntoResponse for VortexError {
    fn into_response(self) -> Response {
        // Internal detail stays in the log; the client only sees the generic message.
        if let Self::Internal(detail) | Self::Configuration(detail) = &self {
            error!("{}", detail);
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> VortexError {
    VortexError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_ERROR_MESSAGE;
    use serde_json::{Value, json};

    async fn render(err: VortexError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let (status, body) = render(VortexError::validation("Invalid invitation ID")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid invitation ID"}));
    }

    #[tokio::test]
    async fn test_internal_error_is_generic() {
        let (status, body) =
            render(VortexError::Internal("db password is hunter2".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": GENERIC_ERROR_MESSAGE}));
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (status, body) = render(method_not_allowed().await).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "Method not allowed"}));
    }
}
