//! Process configuration read from the environment

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(AppEnv::Development),
            "production" => Ok(AppEnv::Production),
            "test" => Ok(AppEnv::Test),
            other => Err(format!(
                "expected development, production or test, got {}",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected pretty or json, got {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub env: AppEnv,
    pub port: u16,
    pub database_url: String,
    pub db_min_connections: u32,
    pub db_max_connections: u32,
    pub otel_endpoint: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env: AppEnv = parse_or(&lookup, "APP_ENV", AppEnv::default())?;
        let default_format = if env == AppEnv::Production {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let db_min_connections = parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 2)?;
        let db_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        if db_min_connections > db_max_connections {
            return Err(ConfigError::Invalid {
                name: "DATABASE_MIN_CONNECTIONS",
                value: db_min_connections.to_string(),
                reason: format!("greater than DATABASE_MAX_CONNECTIONS ({})", db_max_connections),
            });
        }

        Ok(Self {
            env,
            port: parse_or(&lookup, "PORT", 3000)?,
            database_url,
            db_min_connections,
            db_max_connections,
            otel_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
            log_format: parse_or(&lookup, "LOG_FORMAT", default_format)?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnv::Production
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/users")])).unwrap();
        assert_eq!(config.env, AppEnv::Development);
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_min_connections, 2);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.otel_endpoint.is_none());
    }

    #[test]
    fn test_production_logs_json() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/users"),
            ("APP_ENV", "production"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_database_url() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().starts_with("PORT has an invalid value"));

        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("APP_ENV", "staging")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "APP_ENV", .. }));
    }

    #[test]
    fn test_pool_bounds_checked() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "x"),
            ("DATABASE_MIN_CONNECTIONS", "20"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DATABASE_MIN_CONNECTIONS", .. }));
    }
}
