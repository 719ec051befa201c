use crate::domain::TradeDate;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub market_data_api_url: String,
    pub lookup_concurrency: usize,
    pub account_concurrency: usize,
    pub as_of_override: Option<TradeDate>,
    pub persist_retry_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let market_data_api_url = env_map
            .get("MARKET_DATA_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("MARKET_DATA_API_URL".to_string()))?;

        let lookup_concurrency = parse_concurrency(&env_map, "LOOKUP_CONCURRENCY")?;
        let account_concurrency = parse_concurrency(&env_map, "ACCOUNT_CONCURRENCY")?;

        let as_of_override = match env_map.get("AS_OF_DATE") {
            None => None,
            Some(raw) => Some(TradeDate::parse_compact(raw).map_err(|_| {
                ConfigError::InvalidValue(
                    "AS_OF_DATE".to_string(),
                    "must be a YYYYMMDD date".to_string(),
                )
            })?),
        };

        let persist_retry_secs = env_map
            .get("PERSIST_RETRY_SECS")
            .map(|s| s.as_str())
            .unwrap_or("15")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "PERSIST_RETRY_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        Ok(Config {
            database_path,
            market_data_api_url,
            lookup_concurrency,
            account_concurrency,
            as_of_override,
            persist_retry_secs,
        })
    }
}

fn parse_concurrency(
    env_map: &HashMap<String, String>,
    key: &str,
) -> Result<usize, ConfigError> {
    let value = env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or("4")
        .parse::<usize>()
        .map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a valid usize".to_string())
        })?;

    if value == 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(value)
}
