// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AppConfig`] built from them. Configuration is read once at startup and
//! passed explicitly to everything that needs it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `DATA_DIR` | Directory holding the embedded database | `./data` |
//! | `JWT_SECRET` | HMAC secret used to sign session tokens | Required |
//! | `JWT_TTL_SECS` | Session token lifetime in seconds | `604800` (7 days) |
//! | `EMAIL_VERIFICATION_TTL_SECS` | Verification token lifetime | `1800` (30 minutes) |
//! | `BCRYPT_COST` | bcrypt work factor for password hashes | `10` |
//! | `TLS_CERT_PATH` | PEM certificate chain (enables HTTPS with `TLS_KEY_PATH`) | Unset |
//! | `TLS_KEY_PATH` | PEM private key | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{
    env,
    net::SocketAddr,
    path::PathBuf,
    time::Duration,
};

use crate::auth::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// The database file `wallet.redb` is created inside this directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_TTL_ENV: &str = "JWT_TTL_SECS";
pub const EMAIL_VERIFICATION_TTL_ENV: &str = "EMAIL_VERIFICATION_TTL_SECS";
pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_JWT_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_EMAIL_VERIFICATION_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Upper bound for `JWT_TTL_SECS` and `EMAIL_VERIFICATION_TTL_SECS` (10 years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// File name of the embedded database inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "wallet.redb";

/// Minimum accepted length for a JWT secret.
const MIN_JWT_SECRET_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Paths for serving HTTPS with rustls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub email_verification_ttl: Duration,
    pub bcrypt_cost: u32,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    value: host.clone(),
                    reason: e.to_string(),
                })?;

        let jwt_secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: JWT_SECRET_ENV,
                value: "<redacted>".to_string(),
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            });
        }

        let jwt_ttl = parse_ttl(get(JWT_TTL_ENV), JWT_TTL_ENV, DEFAULT_JWT_TTL_SECS)?;
        let email_ttl = parse_ttl(
            get(EMAIL_VERIFICATION_TTL_ENV),
            EMAIL_VERIFICATION_TTL_ENV,
            DEFAULT_EMAIL_VERIFICATION_TTL_SECS,
        )?;

        let bcrypt_cost = parse_or(get(BCRYPT_COST_ENV), BCRYPT_COST_ENV, DEFAULT_BCRYPT_COST)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: BCRYPT_COST_ENV,
                value: bcrypt_cost.to_string(),
                reason: format!("must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"),
            });
        }

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                    reason: "expected `json` or `pretty`".to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            data_dir: get(DATA_DIR_ENV)
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            jwt_secret,
            jwt_ttl,
            email_verification_ttl: email_ttl,
            bcrypt_cost,
            tls,
            log_format,
        })
    }

    /// Full path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}

/// Parse a lifetime in seconds, between 1 and [`MAX_TTL_SECS`].
fn parse_ttl(raw: Option<String>, name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let secs = parse_or(raw, name, default)?;
    if !(1..=MAX_TTL_SECS).contains(&secs) {
        return Err(ConfigError::Invalid {
            name,
            value: secs.to_string(),
            reason: format!("must be between 1 and {MAX_TTL_SECS} seconds"),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const SECRET: (&str, &str) = (JWT_SECRET_ENV, "0123456789abcdef0123");

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = AppConfig::from_lookup(lookup(&[SECRET])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000".parse().unwrap());
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.jwt_ttl, Duration::from_secs(DEFAULT_JWT_TTL_SECS));
        assert_eq!(config.email_verification_ttl, Duration::from_secs(1800));
        assert_eq!(config.bcrypt_cost, DEFAULT_BCRYPT_COST);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.tls.is_none());
        assert!(config.database_path().ends_with(DATABASE_FILE));
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(JWT_SECRET_ENV)));
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(JWT_SECRET_ENV, "short")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: JWT_SECRET_ENV, .. }));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            SECRET,
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9090"),
            (DATA_DIR_ENV, "/tmp/wallet"),
            (JWT_TTL_ENV, "60"),
            (BCRYPT_COST_ENV, "4"),
            (LOG_FORMAT_ENV, "json"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/wallet"));
        assert_eq!(config.jwt_ttl, Duration::from_secs(60));
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_port_and_cost_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[SECRET, (PORT_ENV, "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: PORT_ENV, .. }));

        let err = AppConfig::from_lookup(lookup(&[SECRET, (BCRYPT_COST_ENV, "99")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: BCRYPT_COST_ENV, .. }));
    }

    #[test]
    fn tls_requires_both_paths() {
        let err =
            AppConfig::from_lookup(lookup(&[SECRET, (TLS_CERT_PATH_ENV, "cert.pem")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(TLS_KEY_PATH_ENV)));

        let config = AppConfig::from_lookup(lookup(&[
            SECRET,
            (TLS_CERT_PATH_ENV, "cert.pem"),
            (TLS_KEY_PATH_ENV, "key.pem"),
        ]))
        .unwrap();
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: "cert.pem".into(),
                key: "key.pem".into(),
            })
        );
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[SECRET, (LOG_FORMAT_ENV, "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: LOG_FORMAT_ENV, .. }));
    }

    #[test]
    fn out_of_range_lifetimes_are_rejected() {
        let huge = u64::MAX.to_string();
        for name in [JWT_TTL_ENV, EMAIL_VERIFICATION_TTL_ENV] {
            for value in [huge.as_str(), "0", "315360001"] {
                let err = AppConfig::from_lookup(lookup(&[SECRET, (name, value)])).unwrap_err();
                assert!(
                    matches!(err, ConfigError::Invalid { name: n, .. } if n == name),
                    "{name}={value} accepted"
                );
            }
        }

        let config = AppConfig::from_lookup(lookup(&[
            SECRET,
            (JWT_TTL_ENV, "315360000"),
            (EMAIL_VERIFICATION_TTL_ENV, "315360000"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_ttl, Duration::from_secs(MAX_TTL_SECS));
        assert!(crate::auth::VerificationToken::generate(config.email_verification_ttl).is_ok());
    }
}
