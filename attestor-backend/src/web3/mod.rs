//! Minimal JSON-RPC client for the chain node.
//!
//! Only the handful of methods the gateway needs: read-only eth_call for
//! the oracle and balance lookups, transaction broadcast and receipt
//! polling for the faucet minter. Every call carries a bounded timeout.

use ethers::types::{Address, H256, U64, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

pub mod minter;
pub mod oracle;

pub use minter::{MintReceipt, RpcTokenMinter, TokenMinter};
pub use oracle::{RpcVerificationOracle, VerificationOracle};

pub struct EvmRpc {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: String,
    params: Value,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<Value>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Transaction receipt from eth_getTransactionReceipt
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: H256,
    pub block_number: Option<U64>,
    pub status: Option<U64>,
}

impl EvmRpc {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
            timeout,
        }
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, String> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id: 1,
        };

        log::debug!("[EvmRpc] {} to {}", method, self.url);

        let response = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("RPC request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read RPC response: {}", e))?;

        if !status.is_success() {
            return Err(format!("RPC error ({}) from {}: {}", status, self.url, body));
        }

        let rpc_response: JsonRpcResponse = serde_json::from_str(&body)
            .map_err(|e| format!("Failed to parse RPC response: {} - body: {}", e, body))?;

        if let Some(error) = rpc_response.error {
            return Err(format!("RPC error {}: {}", error.code, error.message));
        }

        rpc_response
            .result
            .ok_or_else(|| "RPC returned null result".to_string())
    }

    /// Make an eth_call (read-only contract call)
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, String> {
        let params = json!([
            {
                "to": format!("{:?}", to),
                "data": format!("0x{}", hex::encode(data))
            },
            "latest"
        ]);

        let result = self.rpc_call("eth_call", params).await?;

        let hex_str = result
            .as_str()
            .ok_or_else(|| "Invalid eth_call response".to_string())?;

        hex::decode(hex_str.trim_start_matches("0x"))
            .map_err(|e| format!("Failed to decode eth_call result: {}", e))
    }

    /// Get transaction count (nonce) for an address
    pub async fn get_transaction_count(&self, address: Address) -> Result<U256, String> {
        let params = json!([format!("{:?}", address), "pending"]);
        let result = self.rpc_call("eth_getTransactionCount", params).await?;
        parse_quantity(&result, "getTransactionCount")
    }

    /// Estimate gas for a transaction
    pub async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
    ) -> Result<U256, String> {
        let params = json!([
            {
                "from": format!("{:?}", from),
                "to": format!("{:?}", to),
                "data": format!("0x{}", hex::encode(data))
            }
        ]);

        let result = self.rpc_call("eth_estimateGas", params).await?;
        parse_quantity(&result, "estimateGas")
    }

    /// Estimate EIP-1559 fees (max_fee_per_gas, max_priority_fee_per_gas)
    pub async fn estimate_eip1559_fees(&self) -> Result<(U256, U256), String> {
        let gas_price_result = self.rpc_call("eth_gasPrice", json!([])).await?;
        let gas_price = parse_quantity(&gas_price_result, "gasPrice")?;

        let priority_result = self.rpc_call("eth_maxPriorityFeePerGas", json!([])).await?;
        let priority_fee = parse_quantity(&priority_result, "maxPriorityFeePerGas")?;

        // Some RPC providers return unexpectedly high priority fees; cap to
        // the gas price, and pad max_fee by 10% so estimates survive drift.
        let capped_priority_fee = std::cmp::min(priority_fee, gas_price);
        let max_fee = gas_price + gas_price / 10;

        Ok((max_fee, capped_priority_fee))
    }

    /// Send a raw signed transaction
    pub async fn send_raw_transaction(&self, signed_tx: &[u8]) -> Result<H256, String> {
        let params = json!([format!("0x{}", hex::encode(signed_tx))]);
        let result = self.rpc_call("eth_sendRawTransaction", params).await?;

        let hash_hex = result
            .as_str()
            .ok_or_else(|| "Invalid sendRawTransaction response".to_string())?;

        hash_hex
            .parse()
            .map_err(|e| format!("Failed to parse tx hash: {}", e))
    }

    /// Get transaction receipt
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, String> {
        let params = json!([format!("{:?}", tx_hash)]);
        let result = self.rpc_call("eth_getTransactionReceipt", params).await?;

        if result.is_null() {
            return Ok(None);
        }

        let receipt: TransactionReceipt = serde_json::from_value(result)
            .map_err(|e| format!("Failed to parse receipt: {}", e))?;

        Ok(Some(receipt))
    }

    /// Wait for a transaction receipt with polling, up to `timeout`.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        timeout: Duration,
    ) -> Result<TransactionReceipt, String> {
        let start = std::time::Instant::now();
        let poll_interval = Duration::from_secs(2);

        loop {
            if start.elapsed() > timeout {
                return Err(format!("Timeout waiting for tx receipt: {:?}", tx_hash));
            }

            match self.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {
                    log::debug!("[EvmRpc] Waiting for receipt of {:?}...", tx_hash);
                    tokio::time::sleep(poll_interval).await;
                }
                Err(e) => {
                    log::warn!("[EvmRpc] Error fetching receipt: {}, retrying...", e);
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }
}

fn parse_quantity(result: &Value, what: &str) -> Result<U256, String> {
    let hex_str = result
        .as_str()
        .ok_or_else(|| format!("Invalid {} response", what))?;

    U256::from_str_radix(hex_str.trim_start_matches("0x"), 16)
        .map_err(|e| format!("Failed to parse {}: {}", what, e))
}

/// First four bytes of the Keccak-256 hash of the function signature.
pub(crate) fn selector(signature: &str) -> [u8; 4] {
    let hash = ethers::utils::keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}
