// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and the authenticated account representation.

use serde::{Deserialize, Serialize};

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the account ID
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// Identity established by a verified session token.
///
/// Handlers receive this through the [`Auth`](super::Auth) extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    /// Account ID from the `sub` claim
    pub account_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl From<SessionClaims> for AuthenticatedAccount {
    fn from(claims: SessionClaims) -> Self {
        Self {
            account_id: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}
