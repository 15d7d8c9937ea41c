//! Environment-sourced configuration.
//!
//! Variables:
//! - `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD` - database
//!   coordinates
//! - `DB_TLS` - TLS posture for database connections (see [`TlsMode`])
//! - `LIBRA_MODE` - `production` (default) or `testing`
//! - `LIBRA_HOST`, `LIBRA_PORT` - HTTP bind address

use std::fmt;

use crate::error::ConfigError;

/// Run mode for the process, from `LIBRA_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Production,
    Testing,
}

impl RunMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "testing" => Ok(Self::Testing),
            _ => Err(ConfigError::Invalid {
                var: "LIBRA_MODE",
                value: value.to_owned(),
                expected: "'production' or 'testing'",
            }),
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn is_testing(self) -> bool {
        self == Self::Testing
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Testing => f.write_str("testing"),
        }
    }
}

/// TLS posture for database connections, from `DB_TLS`.
///
/// The default is `NoVerify`: encrypted transport with certificate and
/// hostname checks skipped. The upstream managed database presents a
/// certificate that does not match its hostname, so this relaxation is a
/// named setting rather than a buried default. Deployments with a proper
/// certificate chain should set `DB_TLS=verify-full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Plaintext connection.
    Disable,
    /// TLS without certificate or hostname verification.
    NoVerify,
    /// Full certificate chain and hostname verification.
    VerifyFull,
}

impl TlsMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "no-verify" => Ok(Self::NoVerify),
            "verify-full" => Ok(Self::VerifyFull),
            _ => Err(ConfigError::Invalid {
                var: "DB_TLS",
                value: value.to_owned(),
                expected: "'disable', 'no-verify' or 'verify-full'",
            }),
        }
    }
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disable => f.write_str("disable"),
            Self::NoVerify => f.write_str("no-verify"),
            Self::VerifyFull => f.write_str("verify-full"),
        }
    }
}

/// Database coordinates and TLS posture.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub tls: TlsMode,
}

/// HTTP bind address.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: RunMode,
    pub db: DbConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let mode = RunMode::parse(&var("LIBRA_MODE", "production"))?;
        let tls = TlsMode::parse(&var("DB_TLS", "no-verify"))?;

        let db_port = var("DB_PORT", "5432");
        let db_port = db_port.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
            var: "DB_PORT",
            value: db_port.clone(),
            expected: "a port number",
        })?;

        let http_port = var("LIBRA_PORT", "5000");
        let http_port = http_port.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
            var: "LIBRA_PORT",
            value: http_port.clone(),
            expected: "a port number",
        })?;

        Ok(Self {
            mode,
            db: DbConfig {
                host: var("DB_HOST", "localhost"),
                port: db_port,
                name: var("DB_NAME", "libra"),
                user: var("DB_USER", "libra"),
                password: var("DB_PASSWORD", ""),
                tls,
            },
            http: HttpConfig {
                host: var("LIBRA_HOST", "0.0.0.0"),
                port: http_port,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key| map.get(key).map(|v| (*v).to_owned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.mode, RunMode::Production);
        assert_eq!(config.db.host, "localhost");
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.db.tls, TlsMode::NoVerify);
        assert_eq!(config.http.port, 5000);
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::from_lookup(lookup(&[
            ("LIBRA_MODE", "testing"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6432"),
            ("DB_TLS", "verify-full"),
            ("LIBRA_PORT", "8080"),
        ]))
        .unwrap();
        assert!(config.mode.is_testing());
        assert_eq!(config.db.host, "db.internal");
        assert_eq!(config.db.port, 6432);
        assert_eq!(config.db.tls, TlsMode::VerifyFull);
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn mode_is_case_insensitive() {
        let config = Config::from_lookup(lookup(&[("LIBRA_MODE", " Testing ")])).unwrap();
        assert!(config.mode.is_testing());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("DB_HOST", "  ")])).unwrap();
        assert_eq!(config.db.host, "localhost");
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[("DB_PORT", "not-a-port")])).unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn bad_tls_mode_is_rejected() {
        let err = Config::from_lookup(lookup(&[("DB_TLS", "yolo")])).unwrap_err();
        assert!(err.to_string().contains("DB_TLS"));
    }
}
