use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::verify::client::VerifyError;

/// Failures surfaced to clients as a JSON `{"message": ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User already exists")]
    UserExists,
    /// One message for unknown email and wrong password, so callers cannot
    /// enumerate accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Any non-approved verification status collapses to this.
    #[error("Invalid verification code")]
    InvalidVerificationCode,
    /// Verification provider failure, message passed through verbatim.
    #[error("{0}")]
    Provider(String),
    #[error("GitHub OAuth callback is not implemented")]
    OauthCallbackUnimplemented,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UserExists
            | Self::InvalidCredentials
            | Self::InvalidVerificationCode
            | Self::Provider(_) => StatusCode::BAD_REQUEST,
            Self::OauthCallbackUnimplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Internal(err) => {
                error!(error = %err, "internal error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response();
            }
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_message_is_passed_through() {
        let err = ApiError::from(VerifyError::Provider("Invalid parameter `To`".into()));
        assert_eq!(err.to_string(), "Invalid parameter `To`");
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_details() {
        let response =
            ApiError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Internal server error");
    }
}
