// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Email verification tokens: 32 random bytes, hex encoded.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};

use super::AuthError;

const TOKEN_BYTES: usize = 32;

/// A freshly issued verification token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    /// Generate a token valid for `ttl` from now.
    pub fn generate(ttl: Duration) -> Result<Self, AuthError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| AuthError::InternalError("system random source failed".to_string()))?;

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AuthError::InternalError(format!("verification ttl out of range: {e}")))?;

        Ok(Self {
            token: hex::encode(bytes),
            expires_at: Utc::now() + ttl,
        })
    }
}
