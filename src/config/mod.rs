pub mod auth;
pub mod bindings;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

pub use auth::AuthConfig;
pub use bindings::ServiceBindings;
pub use storage::{StorageBackend, StorageConfig};

/// Errors raised while assembling configuration from the service binding and env vars
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load auth0 service from either VCAP_SERVICES or environment variables - missing [{}]", .0.join(" "))]
    MissingAuth(Vec<&'static str>),

    #[error("failed to load aws service from either VCAP_SERVICES or environment variables - missing [{}]", .0.join(" "))]
    MissingStorage(Vec<&'static str>),

    #[error("invalid VCAP_SERVICES payload: {0}")]
    InvalidBinding(#[from] serde_json::Error),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Runtime tuning that does not depend on external credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub http_client_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub max_upload_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    /// Marks the session cookie `Secure`
    pub require_https: bool,
    pub session_expiry_hours: u64,
    /// Send the browser through the IdP logout endpoint instead of straight to `/`
    pub federated_logout: bool,
}

impl SecurityConfig {
    /// Session lifetime; zero or anything past chrono's range is rejected
    pub fn session_max_age(&self) -> Result<chrono::Duration, ConfigError> {
        i64::try_from(self.session_expiry_hours)
            .ok()
            .filter(|hours| *hours > 0)
            .and_then(chrono::Duration::try_hours)
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "SESSION_EXPIRY_HOURS",
                value: self.session_expiry_hours.to_string(),
            })
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Defaults per environment, then individual overrides
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        override_parsed(&lookup, "PORT", &mut self.server.port);
        override_parsed(&lookup, "HTTP_CLIENT_TIMEOUT_SECS", &mut self.server.http_client_timeout_secs);

        override_parsed(&lookup, "DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        override_parsed(&lookup, "DATABASE_CONNECTION_TIMEOUT", &mut self.database.connection_timeout);
        override_parsed(&lookup, "DATABASE_RUN_MIGRATIONS", &mut self.database.run_migrations);

        override_parsed(&lookup, "API_ENABLE_REQUEST_LOGGING", &mut self.api.enable_request_logging);
        override_parsed(&lookup, "API_MAX_REQUEST_SIZE_BYTES", &mut self.api.max_request_size_bytes);
        override_parsed(&lookup, "API_MAX_UPLOAD_SIZE_BYTES", &mut self.api.max_upload_size_bytes);

        override_parsed(&lookup, "SECURITY_ENABLE_CORS", &mut self.security.enable_cors);
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        override_parsed(&lookup, "SECURITY_REQUIRE_HTTPS", &mut self.security.require_https);
        override_parsed(&lookup, "SESSION_EXPIRY_HOURS", &mut self.security.session_expiry_hours);
        override_parsed(&lookup, "FEDERATED_LOGOUT", &mut self.security.federated_logout);

        self
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                http_client_timeout_secs: 10,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                max_upload_size_bytes: 512 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:8080".to_string()],
                require_https: false,
                session_expiry_hours: 24 * 7,
                federated_logout: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8080,
                http_client_timeout_secs: 10,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                max_upload_size_bytes: 1024 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://admin-staging.cohesioned.io".to_string()],
                require_https: true,
                session_expiry_hours: 24,
                federated_logout: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                http_client_timeout_secs: 10,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                max_upload_size_bytes: 2 * 1024 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://admin.cohesioned.io".to_string()],
                require_https: true,
                session_expiry_hours: 8,
                federated_logout: true,
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

/// Keeps the current value when the variable is unset or does not parse
fn override_parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T) {
    if let Some(parsed) = lookup(key).and_then(|v| v.trim().parse().ok()) {
        *target = parsed;
    }
}

/// First non-empty value wins
pub(crate) fn first_non_empty(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
