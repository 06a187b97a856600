use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::error;

use crate::response::{ApiResponse, FieldError};

/// Operation-level failures, mapped onto the response envelope at the
/// handler boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation Error.")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    Unauthorized(String),
    #[error("confirmation email could not be delivered")]
    Delivery(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::validation("Validation Error.", errors)),
            )
                .into_response(),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::failure(message)),
            )
                .into_response(),
            AppError::Delivery(source) => {
                error!(error = %source, "email delivery failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::failure("Unable to send confirmation email.")),
                )
                    .into_response()
            }
            AppError::Internal(source) => {
                error!(error = %source, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::failure("Internal Server Error.")),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn status_codes_match_error_kinds() {
        let cases = [
            (
                AppError::Validation(vec![FieldError::new("email", "Email must be specified.")]),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::unauthorized("Email or Password wrong."),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::Delivery(anyhow::anyhow!("smtp down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Internal(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn validation_error_body_lists_every_field() {
        let err = AppError::Validation(vec![
            FieldError::new("firstName", "First name must be specified."),
            FieldError::new("password", "Password must be 6 characters or greater."),
        ]);
        let response = err.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], false);
        assert_eq!(body["message"], "Validation Error.");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn internal_error_detail_is_not_leaked() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused at 10.0.0.5"));
        let response = err.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Internal Server Error.");
    }
}
