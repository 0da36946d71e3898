use std::net::SocketAddr;
use thiserror::Error;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me-in-production";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a secure value in production")]
    InsecureJwtSecret,
    #[error("invalid ARMED_BIND_ADDR {0:?}")]
    InvalidBindAddr(String),
}

/// Server settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    /// Empty means no cross-origin access.
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let production = get("ARMED_ENV").as_deref() == Some("production");

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());
        if jwt_secret == DEV_JWT_SECRET {
            if production {
                return Err(ConfigError::InsecureJwtSecret);
            }
            tracing::warn!("JWT_SECRET is not set; using the development default");
        }

        let raw_addr = get("ARMED_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_addr.clone()))?;

        let cors_origins = get("CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            jwt_secret,
            bind_addr,
            cors_origins,
        })
    }
}
