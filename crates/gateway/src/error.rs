//! Error types for the gateway layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gymops_identity::{AuthError, UserError};
use serde_json::json;
use thiserror::Error;

/// Gateway error types, mapped onto HTTP status codes.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let GatewayError::Internal(detail) = &self {
            tracing::error!(detail, "internal error");
        }
        let body = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<UserError> for GatewayError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::UserNotFound | UserError::RoleNotFound | UserError::PermissionNotFound => {
                GatewayError::NotFound(error.to_string())
            }
            UserError::Database(detail) => GatewayError::Internal(detail),
            other => GatewayError::BadRequest(other.to_string()),
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidToken
            | AuthError::UserNotFound
            | AuthError::SessionNotFound
            | AuthError::SessionNotActive
            | AuthError::SessionExpiredByToken
            | AuthError::SessionExpiredByInactivity => GatewayError::Unauthorized(error.to_string()),
            AuthError::Database(detail) | AuthError::TokenCreationFailed(detail) => {
                GatewayError::Internal(detail)
            }
            other => GatewayError::BadRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            GatewayError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::from(AuthError::SessionNotActive).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::from(UserError::UserNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::from(UserError::PhoneNumberTaken).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = GatewayError::from(UserError::Database("secret sql detail".to_string()));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
