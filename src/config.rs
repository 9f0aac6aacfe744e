use crate::domain::{Address, Amount};
use std::collections::HashMap;
use thiserror::Error;

/// One whole unit of the underlying asset in wei.
pub const DEFAULT_RATE_SCALE: &str = "1000000000000000000";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub oracle_rpc_url: String,
    pub token_contract: Address,
    pub deposit_pool_contract: Address,
    pub rate_scale: Amount,
    pub dao_claim_contract: Option<Address>,
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
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = required(&env_map, "DATABASE_PATH")?;
        let oracle_rpc_url = required(&env_map, "ORACLE_RPC_URL")?;
        let token_contract =
            parse_address("TOKEN_CONTRACT", &required(&env_map, "TOKEN_CONTRACT")?)?;
        let deposit_pool_contract = parse_address(
            "DEPOSIT_POOL_CONTRACT",
            &required(&env_map, "DEPOSIT_POOL_CONTRACT")?,
        )?;

        let rate_scale = env_map
            .get("RATE_SCALE")
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_RATE_SCALE)
            .parse::<Amount>()
            .ok()
            .filter(|scale| !scale.is_zero())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "RATE_SCALE".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let dao_claim_contract = match env_map.get("DAO_CLAIM_CONTRACT") {
            Some(raw) if !raw.trim().is_empty() => {
                Some(parse_address("DAO_CLAIM_CONTRACT", raw)?)
            }
            _ => None,
        };

        Ok(Config {
            port,
            database_path,
            oracle_rpc_url,
            token_contract,
            deposit_pool_contract,
            rate_scale,
            dao_claim_contract,
        })
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_address(key: &str, raw: &str) -> Result<Address, ConfigError> {
    Address::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
