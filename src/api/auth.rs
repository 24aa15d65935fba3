// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints: signup, login, email verification and profile
//! management.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::extract::ApiJson;
use crate::{
    auth::{Auth, VerificationToken},
    error::ApiError,
    models::{MessageResponse, UserProfile},
    state::AppState,
    storage::{Account, NewAccount},
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to register a new account.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
}

/// Signup result. The verification token is returned directly since no
/// mail transport is configured.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub verification_token: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// Bearer token for protected endpoints
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResendVerificationResponse {
    pub message: String,
    pub token: String,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub username: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpdateAccountResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub new_password: String,
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Load the caller's account; tokens outlive deleted accounts.
pub(crate) fn load_account(state: &AppState, account_id: &str) -> Result<Account, ApiError> {
    state
        .db
        .get_account(account_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account.
///
/// Issues an email verification token valid for the configured window.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(mut request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    request.username = request.username.trim().to_string();
    request.email = request.email.trim().to_string();
    request.validate()?;

    // Cheap pre-check to skip hashing; the insert re-checks atomically
    if state.db.find_account_by_email(&request.email)?.is_some() {
        return Err(ApiError::conflict("Email already exists"));
    }

    let password_hash = state.passwords.hash(request.password).await?;
    let verification = VerificationToken::generate(state.email_verification_ttl)?;

    let account = state.db.create_account(NewAccount {
        username: request.username,
        email: request.email,
        password_hash,
        verification_token: verification.token.clone(),
        verification_expires: verification.expires_at,
    })?;

    tracing::info!(account_id = %account.id, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Signup successful. Verify your email.".to_string(),
            verification_token: verification.token,
        }),
    ))
}

/// Exchange email + password for a session token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email and password required"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password required"));
    }

    let Some(account) = state.db.find_account_by_email(&request.email)? else {
        tracing::info!("Login rejected: unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let matches = state
        .passwords
        .verify(request.password, account.password_hash.clone())
        .await?;
    if !matches {
        tracing::info!(account_id = %account.id, "Login rejected: wrong password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = state.tokens.issue(&account.id)?;
    tracing::info!(account_id = %account.id, "Login successful");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: account.into(),
    }))
}

/// Consume an email verification token.
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    tag = "Auth",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(ApiError::bad_request("Invalid or expired token"));
    }

    let account = state.db.verify_email(token, Utc::now())?;
    tracing::info!(account_id = %account.id, "Email verified");

    Ok(Json(MessageResponse::new("Email verified successfully")))
}

/// Issue a new verification token for the caller, replacing any previous one.
#[utoipa::path(
    post,
    path = "/api/auth/resend-verification",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Verification token issued", body = ResendVerificationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn resend_verification(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<ResendVerificationResponse>, ApiError> {
    let verification = VerificationToken::generate(state.email_verification_ttl)?;
    state.db.set_verification_token(
        &caller.account_id,
        &verification.token,
        verification.expires_at,
    )?;

    tracing::info!(account_id = %caller.account_id, "Verification token reissued");

    Ok(Json(ResendVerificationResponse {
        message: "Verification email sent".to_string(),
        token: verification.token,
    }))
}

/// Update the caller's username and/or email.
#[utoipa::path(
    put,
    path = "/api/auth/update",
    tag = "Auth",
    request_body = UpdateAccountRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile updated", body = UpdateAccountResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn update_account(
    Auth(caller): Auth,
    State(state): State<AppState>,
    ApiJson(mut request): ApiJson<UpdateAccountRequest>,
) -> Result<Json<UpdateAccountResponse>, ApiError> {
    request.username = request.username.map(|u| u.trim().to_string());
    request.email = request.email.map(|e| e.trim().to_string());
    request.validate()?;

    let account = state
        .db
        .update_profile(&caller.account_id, request.username, request.email)?;

    tracing::info!(account_id = %account.id, "Profile updated");

    Ok(Json(UpdateAccountResponse {
        message: "User updated".to_string(),
        user: account.into(),
    }))
}

/// Change the caller's password after checking the current one.
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Old password incorrect"),
        (status = 404, description = "User not found")
    )
)]
pub async fn change_password(
    Auth(caller): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let account = load_account(&state, &caller.account_id)?;

    let matches = state
        .passwords
        .verify(request.old_password.clone(), account.password_hash)
        .await?;
    if !matches {
        return Err(ApiError::unauthorized("Old password incorrect"));
    }

    request.validate()?;
    let new_hash = state.passwords.hash(request.new_password).await?;
    state.db.set_password_hash(&caller.account_id, new_hash)?;

    tracing::info!(account_id = %caller.account_id, "Password changed");

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Delete the caller's account.
#[utoipa::path(
    delete,
    path = "/api/auth/delete",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_account(
    Auth(caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.delete_account(&caller.account_id)?;
    tracing::info!(account_id = %caller.account_id, "Account deleted");
    Ok(Json(MessageResponse::new("Account deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedAccount;
    use crate::state::test_support::test_state;

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            username: "ada".into(),
            email: email.into(),
            password: "secret1".into(),
        }
    }

    fn caller(account_id: &str) -> Auth {
        Auth(AuthenticatedAccount {
            account_id: account_id.to_string(),
            issued_at: 0,
            expires_at: 0,
        })
    }

    async fn signup_and_login(state: &AppState, email: &str) -> LoginResponse {
        signup(State(state.clone()), ApiJson(signup_request(email)))
            .await
            .expect("signup succeeds");
        let Json(response) = login(
            State(state.clone()),
            ApiJson(LoginRequest {
                email: email.into(),
                password: "secret1".into(),
            }),
        )
        .await
        .expect("login succeeds");
        response
    }

    #[tokio::test]
    async fn signup_creates_unverified_account() {
        let (state, _dir) = test_state();
        let (status, Json(response)) =
            signup(State(state.clone()), ApiJson(signup_request("Ada@Example.com")))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.verification_token.len(), 64);

        let account = state.db.find_account_by_email("ada@example.com").unwrap().unwrap();
        assert!(!account.is_email_verified);
        assert_ne!(account.password_hash, "secret1");
    }

    #[tokio::test]
    async fn signup_with_used_email_conflicts() {
        let (state, _dir) = test_state();
        signup(State(state.clone()), ApiJson(signup_request("ada@example.com")))
            .await
            .unwrap();

        let err = signup(State(state.clone()), ApiJson(signup_request("ADA@example.com")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn signup_validates_fields() {
        let (state, _dir) = test_state();
        for request in [
            SignupRequest {
                username: "   ".into(),
                ..signup_request("ada@example.com")
            },
            SignupRequest {
                email: "not-an-email".into(),
                ..signup_request("ada@example.com")
            },
            SignupRequest {
                password: "12345".into(),
                ..signup_request("ada@example.com")
            },
        ] {
            let err = signup(State(state.clone()), ApiJson(request)).await.unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
        assert!(state.db.find_account_by_email("ada@example.com").unwrap().is_none());
    }

    #[tokio::test]
    async fn login_issues_token_for_account() {
        let (state, _dir) = test_state();
        let response = signup_and_login(&state, "ada@example.com").await;

        let verified = state.tokens.verify(&response.token).unwrap();
        assert_eq!(verified.account_id, response.user.id);
        assert_eq!(response.user.email, "ada@example.com");
        assert_eq!(response.user.username, "ada");
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let (state, _dir) = test_state();
        signup(State(state.clone()), ApiJson(signup_request("ada@example.com")))
            .await
            .unwrap();

        let wrong_password = login(
            State(state.clone()),
            ApiJson(LoginRequest {
                email: "ada@example.com".into(),
                password: "wrong-password".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);

        let unknown = login(
            State(state.clone()),
            ApiJson(LoginRequest {
                email: "bob@example.com".into(),
                password: "secret1".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

        let missing = login(
            State(state.clone()),
            ApiJson(LoginRequest {
                email: "".into(),
                password: "".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_email_is_single_use() {
        let (state, _dir) = test_state();
        let (_, Json(signed_up)) =
            signup(State(state.clone()), ApiJson(signup_request("ada@example.com")))
                .await
                .unwrap();

        verify_email(
            State(state.clone()),
            ApiJson(VerifyEmailRequest {
                token: signed_up.verification_token.clone(),
            }),
        )
        .await
        .unwrap();
        let account = state.db.find_account_by_email("ada@example.com").unwrap().unwrap();
        assert!(account.is_email_verified);

        let err = verify_email(
            State(state.clone()),
            ApiJson(VerifyEmailRequest {
                token: signed_up.verification_token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resend_verification_replaces_token() {
        let (state, _dir) = test_state();
        let (_, Json(signed_up)) =
            signup(State(state.clone()), ApiJson(signup_request("ada@example.com")))
                .await
                .unwrap();
        let account = state.db.find_account_by_email("ada@example.com").unwrap().unwrap();

        let Json(resent) = resend_verification(caller(&account.id), State(state.clone()))
            .await
            .unwrap();
        assert_ne!(resent.token, signed_up.verification_token);

        let stale = verify_email(
            State(state.clone()),
            ApiJson(VerifyEmailRequest {
                token: signed_up.verification_token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(stale.status, StatusCode::BAD_REQUEST);

        verify_email(State(state.clone()), ApiJson(VerifyEmailRequest { token: resent.token }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_account_changes_profile() {
        let (state, _dir) = test_state();
        let ada = signup_and_login(&state, "ada@example.com").await;
        signup_and_login(&state, "bob@example.com").await;

        let Json(updated) = update_account(
            caller(&ada.user.id),
            State(state.clone()),
            ApiJson(UpdateAccountRequest {
                username: Some(" Lovelace ".into()),
                email: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.user.username, "Lovelace");
        assert_eq!(updated.user.email, "ada@example.com");

        let conflict = update_account(
            caller(&ada.user.id),
            State(state.clone()),
            ApiJson(UpdateAccountRequest {
                username: None,
                email: Some("BOB@example.com".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(conflict.status, StatusCode::CONFLICT);

        let invalid = update_account(
            caller(&ada.user.id),
            State(state.clone()),
            ApiJson(UpdateAccountRequest {
                username: None,
                email: Some("nope".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn change_password_requires_old_password() {
        let (state, _dir) = test_state();
        let ada = signup_and_login(&state, "ada@example.com").await;

        let err = change_password(
            caller(&ada.user.id),
            State(state.clone()),
            ApiJson(ChangePasswordRequest {
                old_password: "wrong".into(),
                new_password: "new-secret".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        change_password(
            caller(&ada.user.id),
            State(state.clone()),
            ApiJson(ChangePasswordRequest {
                old_password: "secret1".into(),
                new_password: "new-secret".into(),
            }),
        )
        .await
        .unwrap();

        let old_login = login(
            State(state.clone()),
            ApiJson(LoginRequest {
                email: "ada@example.com".into(),
                password: "secret1".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(old_login.status, StatusCode::UNAUTHORIZED);

        login(
            State(state.clone()),
            ApiJson(LoginRequest {
                email: "ada@example.com".into(),
                password: "new-secret".into(),
            }),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn delete_account_removes_it() {
        let (state, _dir) = test_state();
        let ada = signup_and_login(&state, "ada@example.com").await;

        delete_account(caller(&ada.user.id), State(state.clone()))
            .await
            .unwrap();
        assert!(state.db.get_account(&ada.user.id).unwrap().is_none());

        // The token is still valid, but the account is gone
        let err = resend_verification(caller(&ada.user.id), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let again = delete_account(caller(&ada.user.id), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(again.status, StatusCode::NOT_FOUND);
    }
}
