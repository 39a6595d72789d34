use std::num::ParseIntError;

use axum::http::HeaderValue;

use crate::cors::OriginPolicy;

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("CINEMA_ALLOWED_ORIGINS is set but lists no origins")]
    EmptyOrigins,

    #[error("invalid allowed origin {0:?}")]
    InvalidOrigin(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cors: OriginPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors: OriginPolicy::default(),
        }
    }
}

impl Config {
    /// Read `PORT`, `CINEMA_HOST` and `CINEMA_ALLOWED_ORIGINS`. Unset or
    /// empty variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };

        let host = var("CINEMA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let cors = match var("CINEMA_ALLOWED_ORIGINS") {
            Some(list) => OriginPolicy::new(parse_origins(&list)?),
            None => OriginPolicy::default(),
        };

        Ok(Self { host, port, cors })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(list: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    let origins = list
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| HeaderValue::from_str(o).map_err(|_| ConfigError::InvalidOrigin(o.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(ConfigError::EmptyOrigins);
    }
    Ok(origins)
}
