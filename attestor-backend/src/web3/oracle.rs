//! Identity-verification oracle
//!
//! Read-only boolean lookup against the verification contract. The gateway
//! treats an unusable answer as "don't know" and never blocks on it; only
//! an explicit false denies a run attestation.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::Address;
use std::time::Duration;

use super::{EvmRpc, selector};

#[async_trait]
pub trait VerificationOracle: Send + Sync {
    /// Returns Some(true/false) when the contract gave a usable answer,
    /// None when it did not (e.g. empty return data).
    async fn is_verified(&self, wallet: Address) -> Result<Option<bool>, String>;
}

/// Oracle backed by an `isVerified(address)` view call.
pub struct RpcVerificationOracle {
    rpc: EvmRpc,
    contract: Address,
}

impl RpcVerificationOracle {
    pub fn new(rpc_url: &str, contract: Address, timeout: Duration) -> Self {
        Self {
            rpc: EvmRpc::new(rpc_url, timeout),
            contract,
        }
    }
}

#[async_trait]
impl VerificationOracle for RpcVerificationOracle {
    async fn is_verified(&self, wallet: Address) -> Result<Option<bool>, String> {
        let mut calldata = selector("isVerified(address)").to_vec();
        calldata.extend_from_slice(&ethers::abi::encode(&[Token::Address(wallet)]));

        let result = self.rpc.eth_call(self.contract, &calldata).await?;

        // A bool returns as one 32-byte word; anything shorter is unusable
        if result.len() < 32 {
            log::warn!(
                "[oracle] unusable isVerified return ({} bytes) for {:?}",
                result.len(),
                wallet
            );
            return Ok(None);
        }

        Ok(Some(result[31] != 0))
    }
}
