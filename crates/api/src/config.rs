//! Process configuration, read once from the environment at start-up.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_DOCUMENTS_UPLOADED: u64 = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}={value:?} is invalid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// Where records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store, optionally seeded from an export at start-up.
    InMemory { seed_file: Option<PathBuf> },
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    /// Upper bound on any single record-store call.
    pub store_timeout: Duration,
    /// Reported verbatim as `documentsUploaded`.
    pub documents_uploaded: u64,
    /// Base URL of the natural-language query service; chat is disabled
    /// when absent.
    pub chat_base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            store: StoreBackend::InMemory { seed_file: None },
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            documents_uploaded: DEFAULT_DOCUMENTS_UPLOADED,
            chat_base_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = parse_or("BIND_ADDR", var("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?;

        let persistent = match var("USE_PERSISTENT_STORES") {
            Some(raw) => parse_bool("USE_PERSISTENT_STORES", &raw)?,
            None => false,
        };

        let store = if persistent {
            StoreBackend::Postgres {
                database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    var("DATABASE_MAX_CONNECTIONS"),
                    Some(DEFAULT_MAX_CONNECTIONS),
                )?,
            }
        } else {
            StoreBackend::InMemory {
                seed_file: var("SEED_FILE").map(PathBuf::from),
            }
        };

        let timeout_ms: u64 = parse_or(
            "STORE_TIMEOUT_MS",
            var("STORE_TIMEOUT_MS"),
            Some(DEFAULT_STORE_TIMEOUT_MS),
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "STORE_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            store,
            store_timeout: Duration::from_millis(timeout_ms),
            documents_uploaded: parse_or(
                "DOCUMENTS_UPLOADED",
                var("DOCUMENTS_UPLOADED"),
                Some(DEFAULT_DOCUMENTS_UPLOADED),
            )?,
            chat_base_url: var("VANNA_API_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
        })
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value: raw,
        }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(config(&[]).unwrap(), AppConfig::default());
    }

    #[test]
    fn persistent_mode_requires_database_url() {
        assert_eq!(
            config(&[("USE_PERSISTENT_STORES", "true")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        );

        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "TRUE"),
            ("DATABASE_URL", "postgres://localhost/spendlens"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/spendlens".to_string(),
                max_connections: 4,
            }
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("STORE_TIMEOUT_MS", "250"),
            ("DOCUMENTS_UPLOADED", "7"),
            ("SEED_FILE", "data/export.json"),
            ("VANNA_API_BASE_URL", "http://vanna:8000/"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.store_timeout, Duration::from_millis(250));
        assert_eq!(cfg.documents_uploaded, 7);
        assert_eq!(
            cfg.store,
            StoreBackend::InMemory { seed_file: Some(PathBuf::from("data/export.json")) }
        );
        assert_eq!(cfg.chat_base_url.as_deref(), Some("http://vanna:8000"));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            config(&[("STORE_TIMEOUT_MS", "soon")]),
            Err(ConfigError::Invalid { name: "STORE_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            config(&[("STORE_TIMEOUT_MS", "0")]),
            Err(ConfigError::Invalid { name: "STORE_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            config(&[("USE_PERSISTENT_STORES", "maybe")]),
            Err(ConfigError::Invalid { name: "USE_PERSISTENT_STORES", .. })
        ));
        assert!(matches!(
            config(&[("BIND_ADDR", "localhost")]),
            Err(ConfigError::Invalid { name: "BIND_ADDR", .. })
        ));
    }
}
