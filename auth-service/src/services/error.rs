use service_core::error::AppError;
use thiserror::Error;

use crate::services::email::ProviderError;

/// Failure kinds of the magic-link flow. Each maps to a distinct response.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidInput,

    #[error("Failed to deliver magic link: {0}")]
    DeliveryFailed(#[from] ProviderError),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput => {
                AppError::Unprocessable(anyhow::anyhow!("Invalid email address"))
            }
            AuthError::DeliveryFailed(e) => AppError::EmailError(e.to_string()),
            AuthError::TokenExpired => AppError::Unauthorized(anyhow::anyhow!("Token has expired")),
            AuthError::TokenInvalid => AppError::Unauthorized(anyhow::anyhow!("Invalid token")),
            AuthError::Internal(e) => AppError::InternalError(e),
        }
    }
}
