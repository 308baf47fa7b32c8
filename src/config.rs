use log::*;

use std::env;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub max_connections: u32,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is not valid: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    /**
     * Read the configuration from the process environment, after loading `.env` if present
     */
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let listen_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| {
            debug!("LISTEN_ADDR not set, using {}", DEFAULT_LISTEN_ADDR);
            DEFAULT_LISTEN_ADDR.to_string()
        });

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DATABASE_MAX_CONNECTIONS",
                        value,
                    })
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Config {
            database_url,
            listen_addr,
            max_connections,
        })
    }
}
