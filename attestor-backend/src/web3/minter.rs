//! Token minting actor
//!
//! Submits a `mint(address,uint256)` transaction with the minter wallet and
//! waits (bounded) for its receipt. The gateway only invokes minting and
//! awaits the result; it holds no store lock across these calls.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::core::k256::ecdsa::SigningKey;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, U256};
use std::time::Duration;

use super::{EvmRpc, selector};

#[derive(Debug, Clone)]
pub struct MintReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

#[async_trait]
pub trait TokenMinter: Send + Sync {
    /// Mint `amount` raw units of `token` to `to` and await confirmation.
    async fn mint(&self, token: Address, to: Address, amount: U256) -> Result<MintReceipt, String>;

    /// ERC-20 balanceOf read.
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, String>;
}

pub struct RpcTokenMinter {
    rpc: EvmRpc,
    wallet: LocalWallet,
    chain_id: u64,
    confirmation_timeout: Duration,
}

impl RpcTokenMinter {
    pub fn new(
        rpc_url: &str,
        private_key: &str,
        chain_id: u64,
        timeout: Duration,
    ) -> Result<Self, String> {
        let key_hex = private_key.strip_prefix("0x").unwrap_or(private_key);
        let key_bytes = hex::decode(key_hex)
            .map_err(|e| format!("Invalid minter key hex: {}", e))?;

        let signing_key = SigningKey::from_bytes(key_bytes.as_slice().into())
            .map_err(|e| format!("Invalid minter key: {}", e))?;

        let wallet = LocalWallet::from(signing_key).with_chain_id(chain_id);

        Ok(Self {
            rpc: EvmRpc::new(rpc_url, timeout),
            wallet,
            chain_id,
            confirmation_timeout: timeout,
        })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

#[async_trait]
impl TokenMinter for RpcTokenMinter {
    async fn mint(&self, token: Address, to: Address, amount: U256) -> Result<MintReceipt, String> {
        let mut calldata = selector("mint(address,uint256)").to_vec();
        calldata.extend_from_slice(&ethers::abi::encode(&[
            Token::Address(to),
            Token::Uint(amount),
        ]));

        let from = self.wallet.address();
        let nonce = self.rpc.get_transaction_count(from).await?;
        let gas = self.rpc.estimate_gas(from, token, &calldata).await?;
        let (max_fee, priority_fee) = self.rpc.estimate_eip1559_fees().await?;

        let tx = Eip1559TransactionRequest::new()
            .from(from)
            .to(token)
            .data(Bytes::from(calldata))
            .nonce(nonce)
            .gas(gas + gas / 5)
            .max_fee_per_gas(max_fee)
            .max_priority_fee_per_gas(priority_fee)
            .chain_id(self.chain_id);

        let typed: TypedTransaction = tx.into();
        let signature = self
            .wallet
            .sign_transaction_sync(&typed)
            .map_err(|e| format!("Failed to sign mint tx: {}", e))?;
        let raw = typed.rlp_signed(&signature);

        let tx_hash = self.rpc.send_raw_transaction(&raw).await?;
        log::info!("[minter] mint tx {:?} broadcast, awaiting receipt", tx_hash);

        let receipt = self
            .rpc
            .wait_for_receipt(tx_hash, self.confirmation_timeout)
            .await?;

        if receipt.status != Some(1.into()) {
            return Err(format!("Mint tx {:?} reverted", tx_hash));
        }

        Ok(MintReceipt {
            tx_hash: format!("{:?}", tx_hash),
            block_number: receipt.block_number.map(|b| b.as_u64()),
        })
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, String> {
        let mut calldata = selector("balanceOf(address)").to_vec();
        calldata.extend_from_slice(&ethers::abi::encode(&[Token::Address(owner)]));

        let result = self.rpc.eth_call(token, &calldata).await?;
        if result.len() < 32 {
            return Err(format!("Invalid balanceOf return ({} bytes)", result.len()));
        }

        Ok(U256::from_big_endian(&result[..32]))
    }
}
