/// Configuration shared by both services
///
/// Values come from environment variables; a `.env` file is loaded by the
/// service binaries before anything here runs.
///
/// # Environment Variables
///
/// - `JWT_SECRET`: Current signing secret (required, at least 32 characters)
/// - `JWT_KEY_ID`: Key id written into issued tokens (default: v1)
/// - `JWT_PREVIOUS_KEYS`: Retired keys still accepted, `kid:secret,kid:secret`
/// - `JWT_TTL_HOURS`: Token lifetime (default: 24)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: per service)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
///
/// Every `from_env` has a `from_source` twin taking a lookup function, which
/// is what the tests use.

use chrono::Duration;
use std::env;

use crate::auth::jwt::{SigningKey, TokenKeys, DEFAULT_TTL_HOURS};

/// Minimum accepted length of a signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Error type for configuration loading
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required variable not set
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// Variable set but unusable
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Reads a variable, treating empty values as unset
pub fn var_from(source: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    source(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Reads and parses a variable, falling back to `default` when unset
pub fn parse_var_from<T>(
    source: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var_from(source, name) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Process environment as a lookup function
pub fn process_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Key id of the current secret
    pub key_id: String,

    /// Current signing secret
    ///
    /// Must be identical in both services. Generate with `openssl rand -hex 32`.
    pub secret: String,

    /// Retired `(kid, secret)` pairs still accepted for verification
    pub previous_keys: Vec<(String, String)>,

    /// Token lifetime in hours
    pub ttl_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("key_id", &self.key_id)
            .field("secret", &"[REDACTED]")
            .field(
                "previous_keys",
                &self.previous_keys.iter().map(|(kid, _)| kid).collect::<Vec<_>>(),
            )
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(process_env)
    }

    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = var_from(&source, "JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        check_secret("JWT_SECRET", &secret)?;

        let key_id = var_from(&source, "JWT_KEY_ID").unwrap_or_else(|| "v1".to_string());

        let previous_keys = match var_from(&source, "JWT_PREVIOUS_KEYS") {
            Some(raw) => parse_previous_keys(&raw)?,
            None => Vec::new(),
        };
        if previous_keys.iter().any(|(kid, _)| kid == &key_id) {
            return Err(ConfigError::Invalid {
                name: "JWT_PREVIOUS_KEYS",
                reason: format!("key id {:?} is also the current key id", key_id),
            });
        }

        let ttl_hours = parse_var_from(&source, "JWT_TTL_HOURS", DEFAULT_TTL_HOURS)?;
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_TTL_HOURS",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            key_id,
            secret,
            previous_keys,
            ttl_hours,
        })
    }

    /// Builds the issuer/verifier for this configuration
    pub fn token_keys(&self) -> TokenKeys {
        TokenKeys::new(SigningKey::new(self.key_id.clone(), self.secret.clone()))
            .with_previous(
                self.previous_keys
                    .iter()
                    .map(|(kid, secret)| SigningKey::new(kid.clone(), secret.clone()))
                    .collect(),
            )
            .with_ttl(Duration::hours(self.ttl_hours))
    }
}

fn check_secret(name: &'static str, secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("must be at least {} characters long", MIN_SECRET_LEN),
        });
    }
    Ok(())
}

fn parse_previous_keys(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (kid, secret) = entry.split_once(':').ok_or_else(|| ConfigError::Invalid {
                name: "JWT_PREVIOUS_KEYS",
                reason: "entries must be kid:secret".to_string(),
            })?;
            let (kid, secret) = (kid.trim(), secret.trim());
            if kid.is_empty() {
                return Err(ConfigError::Invalid {
                    name: "JWT_PREVIOUS_KEYS",
                    reason: "key id must not be empty".to_string(),
                });
            }
            check_secret("JWT_PREVIOUS_KEYS", secret)?;
            Ok((kid.to_string(), secret.to_string()))
        })
        .collect()
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

impl HttpConfig {
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        Self::from_source(process_env, default_port)
    }

    pub fn from_source(
        source: impl Fn(&str) -> Option<String>,
        default_port: u16,
    ) -> Result<Self, ConfigError> {
        let host = var_from(&source, "API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_var_from(&source, "API_PORT", default_port)?;
        let cors_origins = var_from(&source, "CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_origins,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use std::collections::HashMap;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";
    const OLD_SECRET: &str = "retired-secret-key-at-least-32-bytes";

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_jwt_config_defaults() {
        let config = JwtConfig::from_source(source(&[("JWT_SECRET", SECRET)])).unwrap();

        assert_eq!(config.key_id, "v1");
        assert!(config.previous_keys.is_empty());
        assert_eq!(config.ttl_hours, DEFAULT_TTL_HOURS);
    }

    #[test]
    fn test_jwt_config_requires_long_secret() {
        assert_eq!(
            JwtConfig::from_source(source(&[])).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
        assert!(matches!(
            JwtConfig::from_source(source(&[("JWT_SECRET", "short")])),
            Err(ConfigError::Invalid { name: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn test_jwt_config_previous_keys_verify_old_tokens() {
        let old = JwtConfig::from_source(source(&[
            ("JWT_SECRET", OLD_SECRET),
            ("JWT_KEY_ID", "v1"),
        ]))
        .unwrap();
        let token = old
            .token_keys()
            .issue(Uuid::new_v4(), "alice@x.com", Role::Member)
            .unwrap();

        let rotated = JwtConfig::from_source(source(&[
            ("JWT_SECRET", SECRET),
            ("JWT_KEY_ID", "v2"),
            ("JWT_PREVIOUS_KEYS", &format!("v1:{}", OLD_SECRET)),
        ]))
        .unwrap();

        assert_eq!(rotated.previous_keys.len(), 1);
        assert!(rotated.token_keys().verify(&token).is_ok());
    }

    #[test]
    fn test_jwt_config_rejects_bad_previous_keys() {
        assert!(JwtConfig::from_source(source(&[
            ("JWT_SECRET", SECRET),
            ("JWT_PREVIOUS_KEYS", "no-separator"),
        ]))
        .is_err());

        // Reusing the current kid would make verification ambiguous
        assert!(JwtConfig::from_source(source(&[
            ("JWT_SECRET", SECRET),
            ("JWT_PREVIOUS_KEYS", &format!("v1:{}", OLD_SECRET)),
        ]))
        .is_err());
    }

    #[test]
    fn test_jwt_config_ttl() {
        let config = JwtConfig::from_source(source(&[
            ("JWT_SECRET", SECRET),
            ("JWT_TTL_HOURS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.token_keys().ttl(), Duration::hours(2));

        assert!(JwtConfig::from_source(source(&[
            ("JWT_SECRET", SECRET),
            ("JWT_TTL_HOURS", "0"),
        ]))
        .is_err());
    }

    #[test]
    fn test_jwt_config_debug_redacts_secrets() {
        let config = JwtConfig::from_source(source(&[
            ("JWT_SECRET", SECRET),
            ("JWT_KEY_ID", "v2"),
            ("JWT_PREVIOUS_KEYS", &format!("v1:{}", OLD_SECRET)),
        ]))
        .unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains(SECRET));
        assert!(!debug.contains(OLD_SECRET));
        assert!(debug.contains("v1"));
    }

    #[test]
    fn test_http_config() {
        let config = HttpConfig::from_source(source(&[]), 3001).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3001");
        assert_eq!(config.cors_origins, vec!["*".to_string()]);

        let config = HttpConfig::from_source(
            source(&[
                ("API_HOST", "127.0.0.1"),
                ("API_PORT", "8080"),
                ("CORS_ORIGINS", "http://localhost:3000, https://board.example.com"),
            ]),
            3001,
        )
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.cors_origins.len(), 2);

        assert!(HttpConfig::from_source(source(&[("API_PORT", "not-a-port")]), 3001).is_err());
    }
}
