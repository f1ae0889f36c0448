//! Server configuration loaded from environment variables.
//!
//! Every setting has a default so the server starts with zero configuration
//! for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Where documents are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// Volatile collections, empty on every start.
    Memory,
    /// All collections in one JSON document on disk.
    JsonFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Env: `BIND_ADDR` (default `0.0.0.0:3000`), `PORT` overrides the port.
    pub bind_addr: SocketAddr,

    /// Env: `STORAGE` (`json` or `memory`) and `DATABASE_PATH`.
    pub storage: StorageConfig,

    /// Env: `JWT_SECRET`.
    pub jwt_secret: String,

    /// Env: `TOKEN_EXPIRATION_DAYS` (default 7).
    pub token_expiration_days: i64,

    /// Env: `SSE_HEARTBEAT_SECS` (default 30).
    pub heartbeat_interval: Duration,

    /// Per-subscriber queue depth before a slow stream is evicted.
    /// Env: `SSE_SUBSCRIBER_BUFFER` (default 64).
    pub subscriber_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 3000).into(),
            storage: StorageConfig::JsonFile(PathBuf::from("db/database.json")),
            jwt_secret: "fit-fighter-secret-key".to_string(),
            token_expiration_days: 7,
            heartbeat_interval: Duration::from_secs(30),
            subscriber_buffer: 64,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut bind_addr = parse_or(&lookup, "BIND_ADDR", defaults.bind_addr);
        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(port) => bind_addr.set_port(port),
                Err(_) => warn!(value = %port, "Ignoring invalid PORT"),
            }
        }

        let database_path = lookup("DATABASE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let storage = match lookup("STORAGE").as_deref().map(str::trim) {
            Some("memory") => StorageConfig::Memory,
            Some("json") | None => match database_path {
                Some(path) => StorageConfig::JsonFile(path),
                None => defaults.storage,
            },
            Some(other) => {
                warn!(value = %other, "Unknown STORAGE backend, using the JSON file");
                database_path
                    .map(StorageConfig::JsonFile)
                    .unwrap_or(defaults.storage)
            }
        };

        let heartbeat_secs = parse_or(
            &lookup,
            "SSE_HEARTBEAT_SECS",
            defaults.heartbeat_interval.as_secs(),
        )
        .max(1);

        Self {
            bind_addr,
            storage,
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_expiration_days: parse_or(
                &lookup,
                "TOKEN_EXPIRATION_DAYS",
                defaults.token_expiration_days,
            ),
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
            subscriber_buffer: parse_or(
                &lookup,
                "SSE_SUBSCRIBER_BUFFER",
                defaults.subscriber_buffer,
            )
            .max(1),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key = key, value = %raw, "Ignoring unparsable configuration value");
            default
        }),
        None => default,
    }
}
