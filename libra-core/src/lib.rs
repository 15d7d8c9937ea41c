//! libra-core: configuration and shared types for the libra service
//!
//! Configuration is sourced from the environment once at process start
//! (the binary loads `.env` via dotenvy before calling
//! [`Config::from_env`]) and treated as immutable afterwards.

pub mod config;
pub mod error;

pub use config::{Config, DbConfig, HttpConfig, RunMode, TlsMode};
pub use error::ConfigError;
