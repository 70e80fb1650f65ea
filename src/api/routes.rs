//! API Routes
//!
//! HTTP endpoint definitions. Handlers only validate input, call the account
//! service and shape the response.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Account, LedgerError};
use crate::error::{AppError, AppResult};
use crate::handlers::{AccountService, CreateAccountCommand, TransferCommand};
use crate::notification::{credit_description, debit_description, NotificationService};

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub notifications: Arc<dyn NotificationService>,
}

impl AppState {
    pub fn new(accounts: AccountService, notifications: Arc<dyn NotificationService>) -> Self {
        Self {
            accounts,
            notifications,
        }
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub balance: Option<Decimal>,
}

impl CreateAccountRequest {
    fn into_command(self) -> AppResult<CreateAccountCommand> {
        let account_id = self
            .account_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::InvalidRequest("accountId must not be empty".to_string()))?;
        let balance = self
            .balance
            .ok_or_else(|| AppError::InvalidRequest("balance is required".to_string()))?;

        Ok(CreateAccountCommand::new(account_id, balance))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(default)]
    pub account_from: Option<String>,
    #[serde(default)]
    pub account_to: Option<String>,
    #[serde(default)]
    pub transfer_amount: Option<Decimal>,
}

impl TransferRequest {
    fn into_command(self) -> AppResult<TransferCommand> {
        let account_from = self
            .account_from
            .ok_or_else(|| AppError::InvalidRequest("accountFrom is required".to_string()))?;
        let account_to = self
            .account_to
            .ok_or_else(|| AppError::InvalidRequest("accountTo is required".to_string()))?;
        let amount = self
            .transfer_amount
            .ok_or_else(|| AppError::InvalidRequest("transferAmount is required".to_string()))?;

        Ok(TransferCommand::new(account_from, account_to, amount))
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the account API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/v1/accounts", post(create_account))
        .route("/v1/accounts/transfer", post(transfer))
        .route("/v1/accounts/block/:account_id", put(block_account))
        .route("/v1/accounts/unblock/:account_id", put(unblock_account))
        .route("/v1/accounts/:account_id", get(get_account))
}

// =========================================================================
// POST /v1/accounts
// =========================================================================

async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> AppResult<StatusCode> {
    let command = request.into_command()?;
    tracing::info!(account_id = %command.account_id, "Creating account");

    state.accounts.create_account(command)?;
    Ok(StatusCode::CREATED)
}

// =========================================================================
// GET /v1/accounts/:account_id
// =========================================================================

async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> AppResult<Json<Account>> {
    tracing::info!(account_id = %account_id, "Retrieving account");

    state
        .accounts
        .get_account(&account_id)
        .map(Json)
        .ok_or_else(|| LedgerError::AccountNotFound(account_id).into())
}

// =========================================================================
// POST /v1/accounts/transfer
// =========================================================================

async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> AppResult<(StatusCode, String)> {
    let command = request.into_command()?;
    let result = state.accounts.amount_transfer(command)?;

    let from = state
        .accounts
        .get_account(&result.account_from)
        .ok_or_else(|| AppError::Internal(format!("account {} vanished", result.account_from)))?;
    let to = state
        .accounts
        .get_account(&result.account_to)
        .ok_or_else(|| AppError::Internal(format!("account {} vanished", result.account_to)))?;

    state.notifications.notify_about_transfer(
        &from,
        &debit_description(from.account_id(), result.amount),
    );
    state.notifications.notify_about_transfer(
        &to,
        &credit_description(to.account_id(), result.amount),
    );

    Ok((StatusCode::ACCEPTED, "Transfer Completed".to_string()))
}

// =========================================================================
// PUT /v1/accounts/block/:account_id, PUT /v1/accounts/unblock/:account_id
// =========================================================================

async fn block_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> AppResult<String> {
    state.accounts.block_account(&account_id)?;
    Ok(format!("Account {} blocked successfully", account_id))
}

async fn unblock_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> AppResult<String> {
    state.accounts.unblock_account(&account_id)?;
    Ok(format!("Account {} unblocked successfully", account_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_request_validation() {
        let empty = CreateAccountRequest {
            account_id: Some("  ".into()),
            balance: Some(dec!(1)),
        };
        assert!(matches!(empty.into_command(), Err(AppError::InvalidRequest(_))));

        let no_balance = CreateAccountRequest {
            account_id: Some("Id-1".into()),
            balance: None,
        };
        assert!(matches!(no_balance.into_command(), Err(AppError::InvalidRequest(_))));

        let ok: CreateAccountRequest =
            serde_json::from_str(r#"{"accountId":"Id-1","balance":1000}"#).unwrap();
        let command = ok.into_command().unwrap();
        assert_eq!(command.account_id, "Id-1");
        assert_eq!(command.balance, dec!(1000));
    }

    #[test]
    fn test_transfer_request_validation() {
        let request: TransferRequest =
            serde_json::from_str(r#"{"accountFrom":"a","accountTo":"b","transferAmount":100}"#)
                .unwrap();
        let command = request.into_command().unwrap();
        assert_eq!(command.amount, dec!(100));

        let missing: TransferRequest = serde_json::from_str(r#"{"accountFrom":"a"}"#).unwrap();
        assert!(matches!(missing.into_command(), Err(AppError::InvalidRequest(_))));
    }
}
