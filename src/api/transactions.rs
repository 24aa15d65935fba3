// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{
    auth::load_account,
    extract::{ApiJson, ApiQuery},
};
use crate::{
    auth::Auth,
    error::ApiError,
    models::TransactionView,
    state::AppState,
    storage::{EntryKind, EntryStatus, LedgerFilter, NewLedgerEntry},
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Client-recorded transaction. The wallet balance is not changed.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<EntryKind>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    /// Defaults to `pending`
    #[serde(default)]
    pub status: Option<EntryStatus>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub balance_before: Option<Decimal>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub balance_after: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateTransactionResponse {
    pub message: String,
    pub transaction: TransactionView,
}

/// History filters. Empty values are ignored.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Transaction type, e.g. `airtime`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// `pending`, `success` or `failed`
    pub status: Option<String>,
}

impl HistoryQuery {
    fn into_filter(self) -> Result<LedgerFilter, ApiError> {
        let kind = non_empty(self.kind)
            .map(|k| k.parse::<EntryKind>())
            .transpose()
            .map_err(ApiError::bad_request)?;
        let status = non_empty(self.status)
            .map(|s| s.parse::<EntryStatus>())
            .transpose()
            .map_err(ApiError::bad_request)?;
        Ok(LedgerFilter { kind, status })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub transactions: Vec<TransactionView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Record a transaction for the caller.
#[utoipa::path(
    post,
    path = "/api/transactions/create",
    tag = "Transactions",
    request_body = CreateTransactionRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Transaction recorded", body = CreateTransactionResponse),
        (status = 400, description = "Invalid type or amount"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn create_transaction(
    Auth(caller): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<CreateTransactionResponse>), ApiError> {
    let kind = request
        .kind
        .ok_or_else(|| ApiError::bad_request("Transaction type is required"))?;
    let amount = match request.amount {
        Some(amount) if amount > Decimal::ZERO => amount,
        _ => return Err(ApiError::bad_request("Invalid amount")),
    };

    let entry = state.db.record_entry(NewLedgerEntry {
        account_id: caller.account_id.clone(),
        kind,
        amount,
        status: request.status.unwrap_or_default(),
        description: request.description,
        balance_before: request.balance_before,
        balance_after: request.balance_after,
    })?;

    tracing::info!(
        account_id = %caller.account_id,
        reference = %entry.reference,
        %amount,
        kind = %entry.kind,
        "Transaction recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateTransactionResponse {
            message: "Transaction recorded successfully".to_string(),
            transaction: entry.into(),
        }),
    ))
}

/// List the caller's transactions, newest first.
#[utoipa::path(
    get,
    path = "/api/transactions/history",
    tag = "Transactions",
    params(HistoryQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transaction history", body = HistoryResponse),
        (status = 400, description = "Unknown filter value"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_history(
    Auth(caller): Auth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let filter = query.into_filter()?;
    load_account(&state, &caller.account_id)?;
    let entries = state.db.list_entries(&caller.account_id, filter)?;
    Ok(Json(HistoryResponse {
        transactions: entries.into_iter().map(TransactionView::from).collect(),
    }))
}

/// Fetch one of the caller's transactions by reference.
#[utoipa::path(
    get,
    path = "/api/transactions/{reference}",
    tag = "Transactions",
    params(("reference" = String, Path, description = "Transaction reference")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Transaction", body = TransactionView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn get_transaction(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<TransactionView>, ApiError> {
    load_account(&state, &caller.account_id)?;
    let entry = state
        .db
        .find_entry(&caller.account_id, &reference)?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;
    Ok(Json(entry.into()))
}
