// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Client-facing views of stored records. All types derive `Serialize` and
//! `ToSchema` for JSON responses and OpenAPI documentation. Field names are
//! camelCase and money values are JSON numbers.
//!
//! Endpoint-specific request and response bodies live next to their
//! handlers in [`crate::api`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::{Account, EntryKind, EntryStatus, LedgerEntry};

// =============================================================================
// Generic
// =============================================================================

/// Response carrying only a human-readable message.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Account view
// =============================================================================

/// Public view of an account. Never includes credentials or tokens.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_email_verified: bool,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub wallet_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for UserProfile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            is_email_verified: account.is_email_verified,
            wallet_balance: account.wallet_balance,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

// =============================================================================
// Ledger view
// =============================================================================

/// Public view of a ledger entry.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    /// Owning account ID
    pub user: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub status: EntryStatus,
    /// Unique external reference
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<f64>)]
    pub balance_before: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<f64>)]
    pub balance_after: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LedgerEntry> for TransactionView {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            user: entry.account_id,
            kind: entry.kind,
            amount: entry.amount,
            status: entry.status,
            reference: entry.reference,
            description: entry.description,
            balance_before: entry.balance_before,
            balance_after: entry.balance_after,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}
