use chrono::Duration;
use std::{env, fmt};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 1;
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Deployment mode. Only development mode exposes internal error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `JWT_SECRET` is unset or empty.
    MissingSecret,
    /// A variable is set but cannot be parsed.
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::MissingSecret => write!(f, "JWT_SECRET must be set"),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
    pub environment: Environment,
    /// Log the resolved user id of every authenticated request.
    pub auth_debug: bool,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let server_port = match lookup("SERVER_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let ttl_hours = match lookup("JWT_EXPIRES_IN_HOURS") {
            Some(value) => match value.parse::<i64>() {
                Ok(hours) if (1..=MAX_TOKEN_TTL_HOURS).contains(&hours) => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "JWT_EXPIRES_IN_HOURS",
                        value,
                    })
                }
            },
            None => DEFAULT_TOKEN_TTL_HOURS,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| ConfigError::Invalid {
                    key: "BCRYPT_COST",
                    value,
                })?
                .clamp(4, 31),
            None => bcrypt::DEFAULT_COST,
        };

        let environment = match lookup("APP_ENV").as_deref() {
            Some("development") | Some("dev") => Environment::Development,
            _ => Environment::Production,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            server_port,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            jwt_secret,
            token_ttl: Duration::hours(ttl_hours),
            cors_allowed_origins,
            environment,
            auth_debug: matches!(lookup("AUTH_DEBUG").as_deref(), Some("true") | Some("1")),
            bcrypt_cost,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
