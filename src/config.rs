use std::env;

use thiserror::Error;

use crate::password::HashingConfig;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and
/// pulled into handlers and extractors through `FromRef<AppState>`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which backends are allowed.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Which `Repository` implementation backs the stores.
    pub backend: StoreBackend,
    // Postgres connection string. Required when `backend` is `Postgres`.
    pub db_url: Option<String>,
    // Who may delete which user account.
    pub delete_policy: DeletePolicy,
    // Upper bound on the number of articles returned by `/shownews`.
    pub search_limit: i64,
    // Argon2 cost parameters used when hashing new passwords.
    pub hashing: HashingConfig,
}

/// Env
///
/// Defines the runtime context. Production demands a real database and emits JSON logs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// StoreBackend
///
/// Selects the persistence implementation constructed at process start.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// DeletePolicy
///
/// Authorization scope for `/deleteuser`. `SelfOnly` restricts an account to deleting
/// itself; `Privileged` lets any authenticated account delete any other.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeletePolicy {
    SelfOnly,
    Privileged,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },

    #[error("the memory store backend is not allowed in production")]
    MemoryBackendInProduction,
}

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for test scaffolding: in-memory store, self-only deletion
    /// and cheap hashing parameters so suites that register many users stay fast.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:0".to_string(),
            backend: StoreBackend::Memory,
            db_url: None,
            delete_policy: DeletePolicy::SelfOnly,
            search_limit: 100,
            hashing: HashingConfig {
                memory_cost_kib: 1024,
                time_cost: 1,
                parallelism: 1,
            },
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables. Fails fast on anything that is
    /// missing or malformed for the selected environment so the server never starts with
    /// a half-valid configuration.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let backend = match env::var("STORE_BACKEND") {
            Err(_) => StoreBackend::Postgres,
            Ok(value) => match value.as_str() {
                "postgres" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "STORE_BACKEND",
                        value,
                    });
                }
            },
        };

        if env == Env::Production && backend == StoreBackend::Memory {
            return Err(ConfigError::MemoryBackendInProduction);
        }

        let db_url = env::var("DATABASE_URL").ok();
        if backend == StoreBackend::Postgres && db_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let delete_policy = match env::var("USER_DELETE_POLICY") {
            Err(_) => DeletePolicy::SelfOnly,
            Ok(value) => match value.as_str() {
                "self" => DeletePolicy::SelfOnly,
                "privileged" => DeletePolicy::Privileged,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "USER_DELETE_POLICY",
                        value,
                    });
                }
            },
        };

        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_cost_kib: parse_var("ARGON2_MEMORY_KIB", defaults.memory_cost_kib)?,
            time_cost: parse_var("ARGON2_TIME_COST", defaults.time_cost)?,
            parallelism: parse_var("ARGON2_PARALLELISM", defaults.parallelism)?,
        };
        if let Err(e) = hashing.params() {
            let (var, value) = match e {
                argon2::Error::TimeTooSmall => ("ARGON2_TIME_COST", hashing.time_cost),
                argon2::Error::ThreadsTooFew | argon2::Error::ThreadsTooMany => {
                    ("ARGON2_PARALLELISM", hashing.parallelism)
                }
                _ => ("ARGON2_MEMORY_KIB", hashing.memory_cost_kib),
            };
            return Err(ConfigError::Invalid {
                var,
                value: value.to_string(),
            });
        }

        let search_limit: i64 = parse_var("SEARCH_LIMIT", 100)?;
        if search_limit <= 0 {
            return Err(ConfigError::Invalid {
                var: "SEARCH_LIMIT",
                value: search_limit.to_string(),
            });
        }

        Ok(Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            backend,
            db_url,
            delete_policy,
            search_limit,
            hashing,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
