// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage for accounts and the ledger in a single embedded
//! [redb](https://docs.rs/redb) database file.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   wallet.redb
//!     accounts              account_id -> Account (JSON)
//!     account_emails        email -> account_id
//!     verification_tokens   token -> account_id
//!     ledger                reference -> LedgerEntry (JSON)
//!     account_ledger_index  account_id|!sequence -> reference
//!     meta                  counters
//! ```
//!
//! Every public operation runs in exactly one redb transaction.

pub mod accounts;
pub mod database;
pub mod ledger;

pub use accounts::{normalize_email, Account, NewAccount};
pub use database::{StoreError, StoreResult, WalletDatabase};
pub use ledger::{
    BalanceChange, Direction, EntryKind, EntryStatus, LedgerEntry, LedgerFilter, NewLedgerEntry,
};
