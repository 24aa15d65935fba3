// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated accounts.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(account): Auth) -> impl IntoResponse {
//!     // account is AuthenticatedAccount
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedAccount};
use crate::state::AppState;

/// Extractor for authenticated accounts.
///
/// Validates the bearer token from the Authorization header and provides
/// the account ID it was issued for.
///
/// # Example
///
/// ```rust,ignore
/// async fn balance(
///     Auth(account): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<BalanceResponse>, ApiError> {
///     // account.account_id identifies the caller
/// }
/// ```
pub struct Auth(pub AuthenticatedAccount);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        let account = state.tokens.verify(token).inspect_err(|e| {
            tracing::debug!(error_code = e.error_code(), "Rejected session token");
        })?;

        Ok(Auth(account))
    }
}
