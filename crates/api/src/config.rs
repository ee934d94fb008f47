use std::str::FromStr;

use axum::http::HeaderValue;

use fiscal_core::dashboard::DEFAULT_TOP_EXPIRING;
use fiscal_core::importer::DEFAULT_HISTORY_LIMIT;

/// A configuration value that is present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Alert rows on the dashboard when `?top=` is absent (default: `4`).
    pub dashboard_top_expiring: usize,
    /// Import history rows when `?limit=` is absent (default: `10`).
    pub import_history_limit: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `3000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `DASHBOARD_TOP_EXPIRING` | `4`                     |
    /// | `IMPORT_HISTORY_LIMIT`   | `10`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins.iter().find(|o| o.parse::<HeaderValue>().is_err()) {
            return Err(ConfigError::Invalid {
                key: "CORS_ORIGINS",
                expected: "origin",
                value: bad.clone(),
            });
        }

        Ok(Self {
            host,
            port: parse_or(&lookup, "PORT", "u16", 3000)?,
            cors_origins,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", "u64", 30)?,
            dashboard_top_expiring: parse_or(
                &lookup,
                "DASHBOARD_TOP_EXPIRING",
                "usize",
                DEFAULT_TOP_EXPIRING,
            )?,
            import_history_limit: parse_or(
                &lookup,
                "IMPORT_HISTORY_LIMIT",
                "usize",
                DEFAULT_HISTORY_LIMIT,
            )?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            expected,
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.dashboard_top_expiring, 4);
        assert_eq!(config.import_history_limit, 10);
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = load(&[("CORS_ORIGINS", "http://a.test, http://b.test,")]).unwrap();
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn unusable_cors_origin_is_an_error() {
        assert_matches!(
            load(&[("CORS_ORIGINS", "http://a.test,http://b\n.test")]),
            Err(ConfigError::Invalid { key: "CORS_ORIGINS", .. })
        );
    }

    #[test]
    fn malformed_number_is_an_error() {
        assert_matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        );
        assert_matches!(
            load(&[("DASHBOARD_TOP_EXPIRING", "-1")]),
            Err(ConfigError::Invalid { key: "DASHBOARD_TOP_EXPIRING", .. })
        );
    }
}
