// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session tokens, password hashing and email verification tokens.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with email + password (bcrypt comparison)
//! 2. Server issues an HS256 JWT `{sub: account_id, iat, exp}`
//! 3. Client sends `Authorization: Bearer <token>` on protected routes
//! 4. The [`Auth`] extractor verifies signature and expiry and exposes the
//!    account ID to the handler
//!
//! Tokens are not revocable; a password change or account deletion does not
//! invalidate outstanding tokens.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod tokens;
pub mod verification;

pub use claims::{AuthenticatedAccount, SessionClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use password::{PasswordError, PasswordHasher, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
pub use tokens::TokenService;
pub use verification::VerificationToken;
