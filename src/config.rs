use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::env;
use std::fmt;

use crate::models::TaskAccess;

const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;
const MIN_JWT_SECRET_LEN: usize = 32;

/// Configuration problems detected before the server starts.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Origins accepted by the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }
}

pub struct Config {
    pub database: PgConnectOptions,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub server_host: String,
    pub server_port: u16,
    pub allowed_origins: AllowedOrigins,
    pub task_access: TaskAccess,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let database = match get("DATABASE_URL") {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .map_err(|e| ConfigError::Invalid {
                    key: "DATABASE_URL",
                    reason: e.to_string(),
                })?,
            None => {
                let port = match get("DB_PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                        key: "DB_PORT",
                        reason: format!("expected a port number, got {:?}", raw),
                    })?,
                    None => DEFAULT_DB_PORT,
                };
                let ssl_mode = get_or("DB_SSLMODE", "disable")
                    .parse::<PgSslMode>()
                    .map_err(|e| ConfigError::Invalid {
                        key: "DB_SSLMODE",
                        reason: e.to_string(),
                    })?;

                // Parts are passed through unescaped, so any character is allowed.
                PgConnectOptions::new()
                    .host(&get_or("DB_HOST", "localhost"))
                    .port(port)
                    .username(&get_or("DB_USER", "postgres"))
                    .password(&get_or("DB_PASSWORD", ""))
                    .database(&get_or("DB_NAME", "tasks_db"))
                    .ssl_mode(ssl_mode)
            }
        };

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} bytes long", MIN_JWT_SECRET_LEN),
            });
        }

        let jwt_expiration_hours = match get("JWT_EXPIRATION_HOURS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "JWT_EXPIRATION_HOURS",
                        reason: format!("expected a positive number of hours, got {:?}", raw),
                    })
                }
            },
            None => DEFAULT_JWT_EXPIRATION_HOURS,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "BCRYPT_COST",
                        reason: format!("expected a number between 4 and 31, got {:?}", raw),
                    })
                }
            },
            None => bcrypt::DEFAULT_COST,
        };

        let server_port = match get("SERVER_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                reason: format!("expected a port number, got {:?}", raw),
            })?,
            None => DEFAULT_SERVER_PORT,
        };

        let task_access = match get("TASK_ACCESS") {
            Some(raw) => raw.parse::<TaskAccess>().map_err(|reason| ConfigError::Invalid {
                key: "TASK_ACCESS",
                reason,
            })?,
            None => TaskAccess::default(),
        };

        Ok(Self {
            database,
            jwt_secret,
            jwt_expiration_hours,
            bcrypt_cost,
            server_host: get_or("SERVER_HOST", DEFAULT_SERVER_HOST),
            server_port,
            allowed_origins: AllowedOrigins::parse(&get_or("ALLOWED_ORIGINS", "*")),
            task_access,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.database.get_host(), "localhost");
        assert_eq!(config.database.get_port(), 5432);
        assert_eq!(config.database.get_username(), "postgres");
        assert_eq!(config.database.get_database(), Some("tasks_db"));
        assert!(matches!(config.database.get_ssl_mode(), PgSslMode::Disable));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.jwt_expiration_hours, 24);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.allowed_origins, AllowedOrigins::Any);
        assert_eq!(config.task_access, TaskAccess::Shared);
        assert_eq!(config.server_url(), "http://0.0.0.0:3000");
    }

    #[test]
    fn test_config_custom_values() {
        let config = config_from(&[
            ("JWT_SECRET", SECRET),
            ("DB_HOST", "db.internal"),
            ("DB_USER", "tasks"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_NAME", "tasks_prod"),
            ("DB_SSLMODE", "require"),
            ("SERVER_PORT", "8080"),
            ("ALLOWED_ORIGINS", "http://localhost:5173, https://app.example.com"),
            ("TASK_ACCESS", "owner"),
            ("BCRYPT_COST", "4"),
        ])
        .unwrap();

        assert_eq!(config.database.get_host(), "db.internal");
        assert_eq!(config.database.get_username(), "tasks");
        assert_eq!(config.database.get_database(), Some("tasks_prod"));
        assert!(matches!(config.database.get_ssl_mode(), PgSslMode::Require));
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.task_access, TaskAccess::Owner);
        assert_eq!(
            config.allowed_origins,
            AllowedOrigins::List(vec![
                "http://localhost:5173".to_string(),
                "https://app.example.com".to_string()
            ])
        );
    }

    #[test]
    fn test_database_url_takes_precedence() {
        let config = config_from(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "postgres://app@pg.example.com:6543/tasks"),
            ("DB_HOST", "ignored"),
        ])
        .unwrap();
        assert_eq!(config.database.get_host(), "pg.example.com");
        assert_eq!(config.database.get_port(), 6543);
        assert_eq!(config.database.get_username(), "app");
        assert_eq!(config.database.get_database(), Some("tasks"));
    }

    #[test]
    fn test_database_parts_allow_url_special_characters() {
        let config = config_from(&[
            ("JWT_SECRET", SECRET),
            ("DB_HOST", "db.internal"),
            ("DB_PASSWORD", "p@ss/w#rd?x=1"),
            ("DB_NAME", "tasks_prod"),
        ])
        .unwrap();

        assert_eq!(config.database.get_host(), "db.internal");
        assert_eq!(config.database.get_port(), 5432);
        assert_eq!(config.database.get_username(), "postgres");
        assert_eq!(config.database.get_database(), Some("tasks_prod"));
    }

    #[test]
    fn test_jwt_secret_has_no_fallback() {
        assert_eq!(
            config_from(&[]).err(),
            Some(ConfigError::Missing("JWT_SECRET"))
        );
        assert_eq!(
            config_from(&[("JWT_SECRET", "   ")]).err(),
            Some(ConfigError::Missing("JWT_SECRET"))
        );
        assert!(matches!(
            config_from(&[("JWT_SECRET", "your-secret-key")]),
            Err(ConfigError::Invalid { key: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        for (key, value) in [
            ("SERVER_PORT", "http"),
            ("DB_PORT", "99999"),
            ("DB_SSLMODE", "sometimes"),
            ("DATABASE_URL", "not a url"),
            ("JWT_EXPIRATION_HOURS", "0"),
            ("BCRYPT_COST", "2"),
            ("TASK_ACCESS", "everyone"),
        ] {
            let result = config_from(&[("JWT_SECRET", SECRET), (key, value)]);
            assert!(
                matches!(result, Err(ConfigError::Invalid { key: k, .. }) if k == key),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }
}
