// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger entries and the balance-changing operations of [`WalletDatabase`].
//!
//! A balance change and its ledger entry are written in the same redb write
//! transaction. Because redb admits one writer at a time, the balance check
//! in [`WalletDatabase::apply_balance_change`] cannot be raced by a
//! concurrent request.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::accounts::Account;
use super::database::{
    make_index_key, make_prefix, make_prefix_end, read_json, write_json, StoreError,
    StoreResult, WalletDatabase, ACCOUNTS, ACCOUNT_LEDGER_INDEX, LEDGER,
};

/// Kind of ledger entry.
///
/// `Fund` and `Purchase` are written by the wallet endpoints; the remaining
/// kinds are recorded by clients through the transaction API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Airtime,
    Data,
    Electricity,
    Tv,
    WalletFunding,
    Transfer,
    Fund,
    Purchase,
}

impl EntryKind {
    pub const ALL: [EntryKind; 8] = [
        EntryKind::Airtime,
        EntryKind::Data,
        EntryKind::Electricity,
        EntryKind::Tv,
        EntryKind::WalletFunding,
        EntryKind::Transfer,
        EntryKind::Fund,
        EntryKind::Purchase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Airtime => "airtime",
            EntryKind::Data => "data",
            EntryKind::Electricity => "electricity",
            EntryKind::Tv => "tv",
            EntryKind::WalletFunding => "wallet_funding",
            EntryKind::Transfer => "transfer",
            EntryKind::Fund => "fund",
            EntryKind::Purchase => "purchase",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown transaction type `{s}`"))
    }
}

/// Ledger entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Recorded but not settled
    #[default]
    Pending,
    /// Settled
    Success,
    Failed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Success => "success",
            EntryStatus::Failed => "failed",
        }
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EntryStatus::Pending),
            "success" => Ok(EntryStatus::Success),
            "failed" => Ok(EntryStatus::Failed),
            other => Err(format!("unknown transaction status `{other}`")),
        }
    }
}

/// Stored ledger entry. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry identifier (UUID)
    pub id: String,
    /// Owning account
    pub account_id: String,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub status: EntryStatus,
    /// Globally unique external reference (UUID)
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_before: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied entry, recorded as-is without touching the balance.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub account_id: String,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub status: EntryStatus,
    pub description: Option<String>,
    pub balance_before: Option<Decimal>,
    pub balance_after: Option<Decimal>,
}

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

/// A balance change together with the entry that documents it.
#[derive(Debug, Clone)]
pub struct BalanceChange {
    pub account_id: String,
    pub direction: Direction,
    /// Must be positive
    pub amount: Decimal,
    pub kind: EntryKind,
    pub description: String,
}

/// Optional filters for [`WalletDatabase::list_entries`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    pub kind: Option<EntryKind>,
    pub status: Option<EntryStatus>,
}

impl LedgerFilter {
    fn matches(&self, entry: &LedgerEntry) -> bool {
        self.kind.is_none_or(|kind| entry.kind == kind)
            && self.status.is_none_or(|status| entry.status == status)
    }
}

impl WalletDatabase {
    // =========================================================================
    // Balance changes
    // =========================================================================

    /// Credit or debit an account and append the matching ledger entry.
    ///
    /// Debits larger than the current balance fail with
    /// [`StoreError::InsufficientFunds`] and write nothing.
    pub fn apply_balance_change(
        &self,
        change: BalanceChange,
    ) -> StoreResult<(Account, LedgerEntry)> {
        let write_txn = self.db.begin_write()?;
        let result = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut account: Account =
                read_json(&accounts, &change.account_id)?.ok_or(StoreError::AccountNotFound)?;

            let balance_before = account.wallet_balance;
            let balance_after = match change.direction {
                Direction::Credit => balance_before
                    .checked_add(change.amount)
                    .ok_or(StoreError::BalanceOverflow)?,
                Direction::Debit => {
                    if balance_before < change.amount {
                        return Err(StoreError::InsufficientFunds);
                    }
                    balance_before - change.amount
                }
            };

            let now = Utc::now();
            account.wallet_balance = balance_after;
            account.updated_at = now;
            write_json(&mut accounts, &account.id, &account)?;

            let entry = LedgerEntry {
                id: uuid::Uuid::new_v4().to_string(),
                account_id: account.id.clone(),
                kind: change.kind,
                amount: change.amount,
                status: EntryStatus::Success,
                reference: uuid::Uuid::new_v4().to_string(),
                description: Some(change.description),
                balance_before: Some(balance_before),
                balance_after: Some(balance_after),
                created_at: now,
                updated_at: now,
            };
            Self::append_entry(&write_txn, &entry)?;
            (account, entry)
        };
        write_txn.commit()?;
        Ok(result)
    }

    // =========================================================================
    // Ledger CRUD
    // =========================================================================

    /// Record an entry supplied by the client. The balance is not touched.
    pub fn record_entry(&self, new: NewLedgerEntry) -> StoreResult<LedgerEntry> {
        let write_txn = self.db.begin_write()?;
        let entry = {
            let accounts = write_txn.open_table(ACCOUNTS)?;
            if accounts.get(new.account_id.as_str())?.is_none() {
                return Err(StoreError::AccountNotFound);
            }

            let now = Utc::now();
            let entry = LedgerEntry {
                id: uuid::Uuid::new_v4().to_string(),
                account_id: new.account_id,
                kind: new.kind,
                amount: new.amount,
                status: new.status,
                reference: uuid::Uuid::new_v4().to_string(),
                description: new.description,
                balance_before: new.balance_before,
                balance_after: new.balance_after,
                created_at: now,
                updated_at: now,
            };
            Self::append_entry(&write_txn, &entry)?;
            entry
        };
        write_txn.commit()?;
        Ok(entry)
    }

    /// Insert an entry and its index row inside an open write transaction.
    fn append_entry(write_txn: &WriteTransaction, entry: &LedgerEntry) -> StoreResult<()> {
        let sequence = Self::next_sequence(write_txn)?;

        let mut ledger = write_txn.open_table(LEDGER)?;
        if ledger.get(entry.reference.as_str())?.is_some() {
            return Err(StoreError::DuplicateReference(entry.reference.clone()));
        }
        write_json(&mut ledger, &entry.reference, entry)?;

        let mut index = write_txn.open_table(ACCOUNT_LEDGER_INDEX)?;
        let key = make_index_key(&entry.account_id, sequence);
        index.insert(key.as_slice(), entry.reference.as_str())?;
        Ok(())
    }

    /// List an account's entries newest-first, applying the filter.
    pub fn list_entries(
        &self,
        account_id: &str,
        filter: LedgerFilter,
    ) -> StoreResult<Vec<LedgerEntry>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ACCOUNT_LEDGER_INDEX)?;
        let ledger = read_txn.open_table(LEDGER)?;

        let prefix = make_prefix(account_id);
        let prefix_end = make_prefix_end(account_id);

        let mut entries = Vec::new();
        for row in index.range(prefix.as_slice()..prefix_end.as_slice())? {
            let (_, reference) = row?;
            let Some(entry) = read_json::<LedgerEntry, _>(&ledger, reference.value())? else {
                tracing::warn!(
                    account_id,
                    reference = reference.value(),
                    "Ledger index points at a missing entry"
                );
                continue;
            };
            if filter.matches(&entry) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Fetch an entry by reference, only if it belongs to `account_id`.
    pub fn find_entry(&self, account_id: &str, reference: &str) -> StoreResult<Option<LedgerEntry>> {
        let read_txn = self.db.begin_read()?;
        let ledger = read_txn.open_table(LEDGER)?;
        let entry: Option<LedgerEntry> = read_json(&ledger, reference)?;
        Ok(entry.filter(|e| e.account_id == account_id))
    }
}
