// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded wallet database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `accounts`: account_id → serialized [`Account`](super::Account)
//! - `account_emails`: case-folded email → account_id
//! - `verification_tokens`: email verification token → account_id
//! - `ledger`: reference → serialized [`LedgerEntry`](super::LedgerEntry)
//! - `account_ledger_index`: composite key (account_id|!sequence) → reference
//! - `meta`: key → u64 counters
//!
//! redb serializes write transactions, so every multi-table mutation in
//! this module (including balance change + ledger append) commits or rolls
//! back as one unit.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

pub(super) const ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

pub(super) const ACCOUNT_EMAILS: TableDefinition<&str, &str> =
    TableDefinition::new("account_emails");

pub(super) const VERIFICATION_TOKENS: TableDefinition<&str, &str> =
    TableDefinition::new("verification_tokens");

pub(super) const LEDGER: TableDefinition<&str, &[u8]> = TableDefinition::new("ledger");

/// Key format: `account_id | inverted_sequence_be` for newest-first range scans.
pub(super) const ACCOUNT_LEDGER_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("account_ledger_index");

const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const LEDGER_SEQUENCE_KEY: &str = "ledger_sequence";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("email is already registered")]
    EmailTaken,

    #[error("account not found")]
    AccountNotFound,

    #[error("insufficient balance")]
    InsufficientFunds,

    #[error("balance arithmetic overflowed")]
    BalanceOverflow,

    #[error("verification token is invalid or expired")]
    InvalidVerificationToken,

    #[error("ledger reference already exists: {0}")]
    DuplicateReference(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the account_ledger_index table.
///
/// The inverted sequence number makes a forward scan yield newest entries
/// first. Sequence numbers are strictly increasing, so entries written in
/// the same instant still have a total order.
pub(super) fn make_index_key(account_id: &str, sequence: u64) -> Vec<u8> {
    let mut key = make_prefix(account_id);
    key.extend_from_slice(&(!sequence).to_be_bytes());
    key
}

/// Prefix shared by every index key of an account.
pub(super) fn make_prefix(account_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(account_id.len() + 1 + 8);
    prefix.extend_from_slice(account_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a range scan over one account's index keys.
pub(super) fn make_prefix_end(account_id: &str) -> Vec<u8> {
    let mut end = make_prefix(account_id);
    end.extend_from_slice(&[0xFF; 9]);
    end
}

// =============================================================================
// JSON value helpers
// =============================================================================

pub(super) fn read_json<T, Tbl>(table: &Tbl, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

pub(super) fn write_json<T: Serialize>(
    table: &mut redb::Table<'_, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let json = serde_json::to_vec(value)?;
    table.insert(key, json.as_slice())?;
    Ok(())
}

// =============================================================================
// WalletDatabase
// =============================================================================

/// Embedded ACID store for accounts and the ledger.
pub struct WalletDatabase {
    pub(super) db: Database,
}

impl WalletDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(ACCOUNT_EMAILS)?;
            let _ = write_txn.open_table(VERIFICATION_TOKENS)?;
            let _ = write_txn.open_table(LEDGER)?;
            let _ = write_txn.open_table(ACCOUNT_LEDGER_INDEX)?;
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Wallet database opened");
        Ok(Self { db })
    }

    /// Reserve the next ledger sequence number inside an open write transaction.
    pub(super) fn next_sequence(write_txn: &WriteTransaction) -> StoreResult<u64> {
        let mut meta = write_txn.open_table(META)?;
        let current = meta
            .get(LEDGER_SEQUENCE_KEY)?
            .map(|v| v.value())
            .unwrap_or(0);
        let next = current + 1;
        meta.insert(LEDGER_SEQUENCE_KEY, next)?;
        Ok(next)
    }
}
