// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account records and the account-side operations of [`WalletDatabase`].
//!
//! Emails are case-folded before they reach any table, so uniqueness and
//! lookups are case-insensitive.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::database::{
    read_json, write_json, StoreError, StoreResult, WalletDatabase, ACCOUNTS, ACCOUNT_EMAILS,
    VERIFICATION_TOKENS,
};

/// Stored account record.
///
/// The password hash lives here; API responses are built from
/// [`crate::models::UserProfile`] which never carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier (UUID)
    pub id: String,
    /// Display name
    pub username: String,
    /// Case-folded email address
    pub email: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    pub is_email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verification_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verification_expires: Option<DateTime<Utc>>,
    /// Current wallet balance, never negative
    pub wallet_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to register a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub verification_token: String,
    pub verification_expires: DateTime<Utc>,
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl WalletDatabase {
    // =========================================================================
    // Account CRUD
    // =========================================================================

    /// Register a new account.
    ///
    /// Fails with [`StoreError::EmailTaken`] if the email is already in use.
    pub fn create_account(&self, new: NewAccount) -> StoreResult<Account> {
        let now = Utc::now();
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            username: new.username.trim().to_string(),
            email: normalize_email(&new.email),
            password_hash: new.password_hash,
            is_email_verified: false,
            email_verification_token: Some(new.verification_token),
            email_verification_expires: Some(new.verification_expires),
            wallet_balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut emails = write_txn.open_table(ACCOUNT_EMAILS)?;
            if emails.get(account.email.as_str())?.is_some() {
                return Err(StoreError::EmailTaken);
            }
            emails.insert(account.email.as_str(), account.id.as_str())?;

            if let Some(token) = &account.email_verification_token {
                let mut tokens = write_txn.open_table(VERIFICATION_TOKENS)?;
                tokens.insert(token.as_str(), account.id.as_str())?;
            }

            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            write_json(&mut accounts, &account.id, &account)?;
        }
        write_txn.commit()?;
        Ok(account)
    }

    /// Look up an account by ID.
    pub fn get_account(&self, account_id: &str) -> StoreResult<Option<Account>> {
        let read_txn = self.db.begin_read()?;
        let accounts = read_txn.open_table(ACCOUNTS)?;
        read_json(&accounts, account_id)
    }

    /// Look up an account by email (case-insensitive).
    pub fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let email = normalize_email(email);
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(ACCOUNT_EMAILS)?;
        let account_id = match emails.get(email.as_str())? {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        };
        let accounts = read_txn.open_table(ACCOUNTS)?;
        read_json(&accounts, &account_id)
    }

    /// Change username and/or email.
    ///
    /// Moving to an email owned by another account fails with
    /// [`StoreError::EmailTaken`]. Re-submitting the current email is a no-op.
    pub fn update_profile(
        &self,
        account_id: &str,
        username: Option<String>,
        email: Option<String>,
    ) -> StoreResult<Account> {
        let write_txn = self.db.begin_write()?;
        let account = {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut account: Account =
                read_json(&accounts, account_id)?.ok_or(StoreError::AccountNotFound)?;

            if let Some(username) = username {
                account.username = username.trim().to_string();
            }

            if let Some(email) = email {
                let email = normalize_email(&email);
                if email != account.email {
                    let mut emails = write_txn.open_table(ACCOUNT_EMAILS)?;
                    if emails.get(email.as_str())?.is_some() {
                        return Err(StoreError::EmailTaken);
                    }
                    emails.remove(account.email.as_str())?;
                    emails.insert(email.as_str(), account.id.as_str())?;
                    account.email = email;
                }
            }

            account.updated_at = Utc::now();
            write_json(&mut accounts, account_id, &account)?;
            account
        };
        write_txn.commit()?;
        Ok(account)
    }

    /// Replace the stored password hash.
    pub fn set_password_hash(&self, account_id: &str, password_hash: String) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut account: Account =
                read_json(&accounts, account_id)?.ok_or(StoreError::AccountNotFound)?;
            account.password_hash = password_hash;
            account.updated_at = Utc::now();
            write_json(&mut accounts, account_id, &account)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Delete an account and its index entries.
    ///
    /// Ledger entries are retained.
    pub fn delete_account(&self, account_id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let account: Account =
                read_json(&accounts, account_id)?.ok_or(StoreError::AccountNotFound)?;

            let mut emails = write_txn.open_table(ACCOUNT_EMAILS)?;
            emails.remove(account.email.as_str())?;

            if let Some(token) = &account.email_verification_token {
                let mut tokens = write_txn.open_table(VERIFICATION_TOKENS)?;
                tokens.remove(token.as_str())?;
            }

            accounts.remove(account_id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Email verification
    // =========================================================================

    /// Store a fresh verification token, replacing any previous one.
    pub fn set_verification_token(
        &self,
        account_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut account: Account =
                read_json(&accounts, account_id)?.ok_or(StoreError::AccountNotFound)?;

            let mut tokens = write_txn.open_table(VERIFICATION_TOKENS)?;
            if let Some(previous) = &account.email_verification_token {
                tokens.remove(previous.as_str())?;
            }
            tokens.insert(token, account_id)?;

            account.email_verification_token = Some(token.to_string());
            account.email_verification_expires = Some(expires_at);
            account.updated_at = Utc::now();
            write_json(&mut accounts, account_id, &account)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Consume a verification token and mark the owning account verified.
    ///
    /// Unknown and expired tokens both fail with
    /// [`StoreError::InvalidVerificationToken`]; an expired token is left in
    /// place so a later resend can replace it.
    pub fn verify_email(&self, token: &str, now: DateTime<Utc>) -> StoreResult<Account> {
        let write_txn = self.db.begin_write()?;
        let account = {
            let mut tokens = write_txn.open_table(VERIFICATION_TOKENS)?;
            let account_id = match tokens.get(token)? {
                Some(id) => id.value().to_string(),
                None => return Err(StoreError::InvalidVerificationToken),
            };

            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut account: Account = read_json(&accounts, &account_id)?
                .ok_or(StoreError::InvalidVerificationToken)?;

            let still_valid = account
                .email_verification_expires
                .is_some_and(|expires| expires > now);
            if !still_valid {
                return Err(StoreError::InvalidVerificationToken);
            }

            tokens.remove(token)?;
            account.is_email_verified = true;
            account.email_verification_token = None;
            account.email_verification_expires = None;
            account.updated_at = Utc::now();
            write_json(&mut accounts, &account_id, &account)?;
            account
        };
        write_txn.commit()?;
        Ok(account)
    }
}
