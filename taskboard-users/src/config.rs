/// Configuration for the identity service
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string for the users database
/// - `API_HOST` / `API_PORT`: Listener (default: 0.0.0.0:3001)
/// - `CORS_ORIGINS`: Allowed browser origins (default: *)
/// - `JWT_SECRET`, `JWT_KEY_ID`, `JWT_PREVIOUS_KEYS`, `JWT_TTL_HOURS`:
///   Token signing, shared with the task service
///
/// # Example
///
/// ```no_run
/// use taskboard_users::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Identity service will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use taskboard_shared::config::{HttpConfig, JwtConfig};
use taskboard_shared::db::pool::DatabaseConfig;

/// Default port of the identity service
pub const DEFAULT_PORT: u16 = 3001;

/// Complete identity service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener and CORS
    pub http: HttpConfig,

    /// Users database
    pub database: DatabaseConfig,

    /// Token signing keys
    pub jwt: JwtConfig,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` or `JWT_SECRET` is missing, or any
    /// variable has an invalid value.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Ok(Self {
            http: HttpConfig::from_env(DEFAULT_PORT)?,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        self.http.bind_address()
    }
}
