use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message returned whenever a model is required but absent.
pub const NOT_TRAINED_MESSAGE: &str = "Model not trained yet. Please train the model first.";

/// Errors surfaced by HTTP handlers as `{success: false, error, detail?}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing request input.
    #[error("{0}")]
    Validation(String),
    /// Prediction requested before any model exists.
    #[error("Model not trained yet. Please train the model first.")]
    NotTrained,
    /// Dataset missing or unusable.
    #[error("{0}")]
    Data(String),
    /// Unexpected failure; `detail` carries the full error chain.
    #[error("{message}")]
    Internal {
        /// Client-facing summary.
        message: String,
        /// Diagnostic detail.
        detail: String,
    },
    /// Unknown route.
    #[error("Not found")]
    NotFound,
    /// Known route, unsupported method.
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    /// Internal error built from a summary prefix and the source chain.
    pub fn internal(prefix: &str, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut detail = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Internal {
            message: format!("{prefix}: {err}"),
            detail,
        }
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NotTrained | Self::Data(_) => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Internal { message, detail } => {
                tracing::error!(%detail, "{message}");
                json!({ "success": false, "error": message, "detail": detail })
            }
            other => json!({ "success": false, "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_maps_to_bad_request() {
        let (status, body) = body_of(ApiError::Validation("Message cannot be empty".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Message cannot be empty");
        assert!(body.get("detail").is_none());
    }

    #[tokio::test]
    async fn internal_carries_detail_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let (status, body) = body_of(ApiError::internal("Training failed", &io)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Training failed: denied");
        assert_eq!(body["detail"], "denied");
    }

    #[tokio::test]
    async fn not_trained_uses_fixed_message() {
        let (status, body) = body_of(ApiError::NotTrained).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], NOT_TRAINED_MESSAGE);
    }

    #[tokio::test]
    async fn method_not_allowed_is_json() {
        let (status, body) = body_of(ApiError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Method not allowed");
    }
}
