//! Application settings: per-environment presets overlaid with environment
//! variables (`APP_ENV` picks the preset).

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("APP_ENV").as_deref().map(str::to_ascii_lowercase).as_deref() {
            Ok("production") | Ok("prod") => Self::Production,
            Ok("staging") | Ok("stage") => Self::Staging,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Unset means no PostgreSQL store can be opened.
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    /// `*` allows any origin.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::for_environment(Environment::from_env()).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Staging => Self::staging(),
            Environment::Production => Self::production(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        override_from(&mut self.server.port, "SERVER_PORT");
        override_from(&mut self.server.port, "PORT");

        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = Some(url).filter(|s| !s.trim().is_empty());
        }
        override_from(&mut self.database.max_connections, "DATABASE_MAX_CONNECTIONS");
        override_from(&mut self.database.connection_timeout, "DATABASE_CONNECTION_TIMEOUT");
        override_from(&mut self.database.enable_query_logging, "DATABASE_ENABLE_QUERY_LOGGING");
        override_from(&mut self.database.slow_query_threshold_ms, "DATABASE_SLOW_QUERY_THRESHOLD_MS");

        override_from(&mut self.pagination.default_limit, "PAGINATION_DEFAULT_LIMIT");
        override_from(&mut self.pagination.max_limit, "PAGINATION_MAX_LIMIT");
        override_from(&mut self.api.max_request_size_bytes, "API_MAX_REQUEST_SIZE_BYTES");

        override_from(&mut self.security.enable_cors, "SECURITY_ENABLE_CORS");
        if let Ok(raw) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&raw);
        }

        self.normalized()
    }

    /// Keep pagination limits usable whatever the environment says.
    fn normalized(mut self) -> Self {
        self.pagination.max_limit = self.pagination.max_limit.max(1);
        self.pagination.default_limit = self.pagination.default_limit.clamp(1, self.pagination.max_limit);
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn preset(environment: Environment, host: &str, port: u16, database: DatabaseConfig, body_mb: usize, origins: &[&str]) -> Self {
        Self {
            environment,
            server: ServerConfig { host: host.to_string(), port },
            database,
            pagination: PaginationConfig { default_limit: 10, max_limit: 100 },
            api: ApiConfig { max_request_size_bytes: body_mb * 1024 * 1024 },
            security: SecurityConfig {
                enable_cors: !origins.is_empty(),
                cors_origins: origins.iter().map(|o| o.to_string()).collect(),
            },
        }
    }

    fn development() -> Self {
        let database = DatabaseConfig {
            url: None,
            max_connections: 5,
            connection_timeout: 30,
            enable_query_logging: true,
            slow_query_threshold_ms: 100,
        };
        Self::preset(Environment::Development, "127.0.0.1", 3000, database, 10, &["*"])
    }

    fn staging() -> Self {
        let database = DatabaseConfig {
            url: None,
            max_connections: 15,
            connection_timeout: 10,
            enable_query_logging: true,
            slow_query_threshold_ms: 500,
        };
        Self::preset(Environment::Staging, "0.0.0.0", 3000, database, 5, &[])
    }

    fn production() -> Self {
        let database = DatabaseConfig {
            url: None,
            max_connections: 30,
            connection_timeout: 5,
            enable_query_logging: false,
            slow_query_threshold_ms: 1000,
        };
        // admin UI is served same-origin; CORS only when origins are configured
        Self::preset(Environment::Production, "0.0.0.0", 8080, database, 2, &[])
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn override_from<T: FromStr>(target: &mut T, name: &str) {
    if let Some(value) = env::var(name).ok().and_then(|raw| raw.trim().parse().ok()) {
        *target = value;
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
        assert!(config.database.enable_query_logging);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.security.cors_origins, vec!["*"]);
    }

    #[test]
    fn production_defaults() {
        let config = AppConfig::for_environment(Environment::Production);
        assert!(!config.database.enable_query_logging);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.port, 8080);
        assert!(!config.security.enable_cors);
        assert_eq!(config.api.max_request_size_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn normalizes_pagination_limits() {
        let mut config = AppConfig::development();
        config.pagination.max_limit = 0;
        config.pagination.default_limit = 50;
        let config = config.normalized();
        assert_eq!(config.pagination.max_limit, 1);
        assert_eq!(config.pagination.default_limit, 1);
    }

    #[test]
    fn splits_origin_lists() {
        assert_eq!(split_list(" https://a.test, ,https://b.test "), vec!["https://a.test", "https://b.test"]);
    }
}
