// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{sync::Arc, time::Duration};

use crate::{
    auth::{PasswordHasher, TokenService},
    config::AppConfig,
    storage::WalletDatabase,
};

/// Shared service context handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<WalletDatabase>,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordHasher,
    pub email_verification_ttl: Duration,
}

impl AppState {
    pub fn new(
        db: WalletDatabase,
        tokens: TokenService,
        passwords: PasswordHasher,
        email_verification_ttl: Duration,
    ) -> Self {
        Self {
            db: Arc::new(db),
            tokens: Arc::new(tokens),
            passwords,
            email_verification_ttl,
        }
    }

    pub fn from_config(db: WalletDatabase, config: &AppConfig) -> Self {
        Self::new(
            db,
            TokenService::new(config.jwt_secret.as_bytes(), config.jwt_ttl),
            PasswordHasher::new(config.bcrypt_cost),
            config.email_verification_ttl,
        )
    }
}
