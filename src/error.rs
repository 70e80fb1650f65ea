//! Error handling module
//!
//! HTTP-facing error type and response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::LedgerError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Engine errors
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Ledger(err) => match err {
                LedgerError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "account_not_found"),
                LedgerError::DuplicateEntity(_) => (StatusCode::BAD_REQUEST, "duplicate_account"),
                LedgerError::InsufficientBalance { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient_balance")
                }
                LedgerError::AccountBlocked(_) => (StatusCode::BAD_REQUEST, "account_blocked"),
                LedgerError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
                LedgerError::VersionConflict { .. } => (StatusCode::CONFLICT, "version_conflict"),
                LedgerError::TransactionAlreadyActive => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "transaction_already_active")
                }
                LedgerError::NoActiveTransaction => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "no_active_transaction")
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let details = match &self {
            AppError::InvalidRequest(msg) => Some(msg.clone()),
            AppError::Ledger(err) if err.is_protocol_error() => {
                tracing::error!("Transaction protocol error: {}", err);
                None
            }
            AppError::Ledger(_) => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
