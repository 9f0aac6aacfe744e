//! Ethereum JSON-RPC oracle implementation.

use super::{OracleError, OracleReader};
use crate::domain::{Address, Amount};
use alloy_primitives::{keccak256, U256};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const GET_EXCHANGE_RATE: &str = "getExchangeRate()";
const GET_TOTAL_COLLATERAL: &str = "getTotalCollateral()";
const GET_BALANCE: &str = "getBalance()";
const GET_EXCESS_BALANCE: &str = "getExcessBalance()";

/// Oracle reading the token and deposit pool contracts through `eth_call`.
#[derive(Debug, Clone)]
pub struct JsonRpcOracle {
    client: Client,
    rpc_url: String,
    token_contract: Address,
    deposit_pool_contract: Address,
}

impl JsonRpcOracle {
    pub fn new(rpc_url: String, token_contract: Address, deposit_pool_contract: Address) -> Self {
        Self {
            client: Client::new(),
            rpc_url,
            token_contract,
            deposit_pool_contract,
        }
    }

    /// Call a zero-argument view function at `block` and decode the uint256 result.
    async fn call_uint(
        &self,
        contract: &Address,
        signature: &str,
        block: u64,
    ) -> Result<Amount, OracleError> {
        debug!(contract = %contract, signature, block, "eth_call");

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": contract.as_str(), "data": call_data(signature) },
                format!("0x{:x}", block)
            ]
        });

        let response = self.post_rpc(payload).await?;

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown rpc error")
                .to_string();
            return Err(OracleError::Unavailable(format!("{}: {}", signature, message)));
        }

        let result = response
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| OracleError::Parse("missing result".to_string()))?;

        parse_uint_word(result).map(Amount::new)
    }

    async fn post_rpc(
        &self,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, OracleError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&self.rpc_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(OracleError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(OracleError::Http {
                    status: status.as_u16(),
                    message: "Retryable RPC error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(OracleError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(OracleError::Parse(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl OracleReader for JsonRpcOracle {
    async fn get_exchange_rate(&self, block: u64) -> Result<Amount, OracleError> {
        self.call_uint(&self.token_contract, GET_EXCHANGE_RATE, block)
            .await
    }

    async fn get_pool_balance(&self, block: u64) -> Result<Amount, OracleError> {
        self.call_uint(&self.deposit_pool_contract, GET_BALANCE, block)
            .await
    }

    async fn get_excess_pool_balance(&self, block: u64) -> Result<Amount, OracleError> {
        self.call_uint(&self.deposit_pool_contract, GET_EXCESS_BALANCE, block)
            .await
    }

    async fn get_total_collateral(&self, block: u64) -> Result<Amount, OracleError> {
        self.call_uint(&self.token_contract, GET_TOTAL_COLLATERAL, block)
            .await
    }
}

/// `0x`-prefixed 4-byte selector of a function signature.
fn call_data(signature: &str) -> String {
    let hash = keccak256(signature.as_bytes());
    format!("0x{}", hex::encode(&hash[..4]))
}

/// Decode a single ABI `uint256` return word.
fn parse_uint_word(result: &str) -> Result<U256, OracleError> {
    let digits = result
        .strip_prefix("0x")
        .ok_or_else(|| OracleError::Parse(format!("result without 0x prefix: {}", result)))?;
    if digits.is_empty() {
        // Empty return data: the contract does not exist at this block.
        return Err(OracleError::Unavailable("empty eth_call result".to_string()));
    }
    if digits.len() > 64 {
        return Err(OracleError::Parse(format!("result wider than one word: {}", result)));
    }
    U256::from_str_radix(digits, 16).map_err(|e| OracleError::Parse(e.to_string()))
}
