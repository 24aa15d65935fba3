// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! VTU Wallet - Wallet backend for airtime, data and utility top-ups
//!
//! Accounts sign up with email and password, fund a wallet balance and pay
//! for purchases from it. Every balance change is recorded in a ledger.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session tokens, password hashing and email verification
//! - `config` - Environment configuration
//! - `storage` - Embedded redb database for accounts and the ledger

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod storage;
