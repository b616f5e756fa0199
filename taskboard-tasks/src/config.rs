/// Configuration for the task service
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string for the tasks database
/// - `API_HOST` / `API_PORT`: Listener (default: 0.0.0.0:3002)
/// - `CORS_ORIGINS`: Allowed browser origins (default: *)
/// - `JWT_SECRET`, `JWT_KEY_ID`, `JWT_PREVIOUS_KEYS`, `JWT_TTL_HOURS`:
///   Must match the identity service
/// - `USER_SERVICE_URL`: Base URL of the identity service (required)
/// - `USER_SERVICE_TIMEOUT_MS`: Timeout for identity lookups (default: 5000)

use std::time::Duration;

use taskboard_shared::config::{
    parse_var_from, process_env, var_from, ConfigError, HttpConfig, JwtConfig,
};
use taskboard_shared::db::pool::DatabaseConfig;

/// Default port of the task service
pub const DEFAULT_PORT: u16 = 3002;

/// Default identity lookup timeout in milliseconds
pub const DEFAULT_USER_SERVICE_TIMEOUT_MS: u64 = 5000;

/// Complete task service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub user_service: UserServiceConfig,
}

/// Where and how to reach the identity service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserServiceConfig {
    /// Base URL, e.g. `http://localhost:3001`
    pub url: String,

    /// Per-request timeout; the only bound on a hanging lookup
    pub timeout: Duration,
}

impl UserServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(process_env)
    }

    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = var_from(&source, "USER_SERVICE_URL")
            .ok_or(ConfigError::Missing("USER_SERVICE_URL"))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "USER_SERVICE_URL",
                reason: "must start with http:// or https://".to_string(),
            });
        }

        let timeout_ms = parse_var_from(
            &source,
            "USER_SERVICE_TIMEOUT_MS",
            DEFAULT_USER_SERVICE_TIMEOUT_MS,
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "USER_SERVICE_TIMEOUT_MS",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Ok(Self {
            http: HttpConfig::from_env(DEFAULT_PORT)?,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            user_service: UserServiceConfig::from_env()?,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        self.http.bind_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_user_service_config() {
        let config = UserServiceConfig::from_source(source(&[(
            "USER_SERVICE_URL",
            "http://localhost:3001/",
        )]))
        .unwrap();
        assert_eq!(config.url, "http://localhost:3001");
        assert_eq!(config.timeout, Duration::from_millis(5000));

        let config = UserServiceConfig::from_source(source(&[
            ("USER_SERVICE_URL", "http://users:3001"),
            ("USER_SERVICE_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_user_service_config_rejects_bad_values() {
        assert_eq!(
            UserServiceConfig::from_source(source(&[])).unwrap_err(),
            ConfigError::Missing("USER_SERVICE_URL")
        );
        assert!(UserServiceConfig::from_source(source(&[("USER_SERVICE_URL", "users:3001")])).is_err());
        assert!(UserServiceConfig::from_source(source(&[
            ("USER_SERVICE_URL", "http://users:3001"),
            ("USER_SERVICE_TIMEOUT_MS", "0"),
        ]))
        .is_err());
    }
}
