use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::response::Envelope;

/// Failures of the account, profile and ledger operations.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("An account with this email already exists")]
    DuplicateEmail,

    // Same message for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("storage unavailable: {0:#}")]
    StorageUnavailable(anyhow::Error),
}

impl From<anyhow::Error> for AccountError {
    fn from(e: anyhow::Error) -> Self {
        AccountError::StorageUnavailable(e)
    }
}

/// Everything a handler can fail with; renders as a `success: false` envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("You can only access your own account")]
    Forbidden,

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Account(AccountError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Account(AccountError::DuplicateEmail) => StatusCode::CONFLICT,
            ApiError::Account(AccountError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Account(AccountError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Account(AccountError::StorageUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Account(AccountError::StorageUnavailable(e)) => {
                error!(error = ?e, "storage unavailable");
                "Service temporarily unavailable, please try again".to_string()
            }
            ApiError::Internal(e) => {
                error!(error = ?e, "internal error");
                "Something went wrong, please try again".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(Envelope::<()>::failure(message))).into_response()
    }
}
