use std::env;

use thiserror::Error;

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// immutable afterwards; handlers and extractors pull it from `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` (local only) selects the in-memory store.
    pub db_url: Option<String>,
    // Runtime environment marker. Controls the local auth bypass and log format.
    pub env: Env,
    // Secret used to validate incoming HS256 bearer tokens.
    pub jwt_secret: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Where unauthenticated actors are sent; the login flow lives outside this service.
    pub login_url: String,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (header bypass, pretty logs, in-memory store) and production behaviour.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
}

impl Default for AppConfig {
    /// A configuration that needs no environment variables, for tests.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            login_url: "/accounts/login/".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production refuses to start
    /// without a database and a real JWT secret; local falls back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let db_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(db_url.ok_or(ConfigError::Missing("DATABASE_URL"))?),
                jwt_secret.ok_or(ConfigError::Missing("JWT_SECRET"))?,
            ),
            Env::Local => (
                db_url,
                jwt_secret.unwrap_or_else(|| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        Ok(Self {
            db_url,
            env,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            login_url: env::var("LOGIN_URL").unwrap_or_else(|_| "/accounts/login/".to_string()),
        })
    }
}
