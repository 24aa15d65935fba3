// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet balance endpoints.
//!
//! Fund and deduct each run as a single storage write transaction that
//! checks the balance, updates it and appends the ledger entry.

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{auth::load_account, extract::ApiJson};
use crate::{
    auth::Auth,
    error::ApiError,
    models::TransactionView,
    state::AppState,
    storage::{BalanceChange, Direction, EntryKind},
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub wallet_balance: Decimal,
}

/// Amount to credit or debit.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WalletAmountRequest {
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdateResponse {
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub wallet_balance: Decimal,
    pub transaction: TransactionView,
}

// =============================================================================
// Helper Functions
// =============================================================================

fn positive_amount(amount: Option<Decimal>) -> Result<Decimal, ApiError> {
    match amount {
        Some(amount) if amount > Decimal::ZERO => Ok(amount),
        _ => Err(ApiError::bad_request("Invalid amount")),
    }
}

fn description_or(description: Option<String>, default: &str) -> String {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn apply_change(
    state: &AppState,
    account_id: &str,
    direction: Direction,
    request: WalletAmountRequest,
) -> Result<WalletUpdateResponse, ApiError> {
    let amount = positive_amount(request.amount)?;
    let (kind, default_description, message) = match direction {
        Direction::Credit => (EntryKind::Fund, "Wallet funding", "Wallet funded"),
        Direction::Debit => (EntryKind::Purchase, "Wallet deduction", "Purchase successful"),
    };

    let (account, entry) = state
        .db
        .apply_balance_change(BalanceChange {
            account_id: account_id.to_string(),
            direction,
            amount,
            kind,
            description: description_or(request.description, default_description),
        })
        .inspect_err(|e| {
            tracing::info!(account_id, %amount, error = %e, "Balance change rejected");
        })?;

    tracing::info!(
        account_id,
        reference = %entry.reference,
        %amount,
        balance = %account.wallet_balance,
        kind = %entry.kind,
        "Wallet balance updated"
    );

    Ok(WalletUpdateResponse {
        message: message.to_string(),
        wallet_balance: account.wallet_balance,
        transaction: entry.into(),
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Get the caller's wallet balance.
#[utoipa::path(
    get,
    path = "/api/wallet/balance",
    tag = "Wallet",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_balance(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = load_account(&state, &caller.account_id)?;
    Ok(Json(BalanceResponse {
        wallet_balance: account.wallet_balance,
    }))
}

/// Credit the caller's wallet.
#[utoipa::path(
    post,
    path = "/api/wallet/fund",
    tag = "Wallet",
    request_body = WalletAmountRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Wallet funded", body = WalletUpdateResponse),
        (status = 400, description = "Invalid amount"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn fund_wallet(
    Auth(caller): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WalletAmountRequest>,
) -> Result<Json<WalletUpdateResponse>, ApiError> {
    apply_change(&state, &caller.account_id, Direction::Credit, request).map(Json)
}

/// Debit the caller's wallet. Fails without side effects when the balance
/// is too low.
#[utoipa::path(
    post,
    path = "/api/wallet/deduct",
    tag = "Wallet",
    request_body = WalletAmountRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Purchase successful", body = WalletUpdateResponse),
        (status = 400, description = "Invalid amount or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn deduct_wallet(
    Auth(caller): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WalletAmountRequest>,
) -> Result<Json<WalletUpdateResponse>, ApiError> {
    apply_change(&state, &caller.account_id, Direction::Debit, request).map(Json)
}
