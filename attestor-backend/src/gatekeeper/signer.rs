//! EIP-712 attestation signing
//!
//! Builds domain-separated typed messages and signs them with the service
//! key. Field order and type strings are part of the contract with the
//! on-chain verifier and must match bit-for-bit; the same field values
//! under a different message kind or domain never produce an
//! interchangeable signature.

use ethers::abi::Token;
use ethers::core::k256::ecdsa::SigningKey;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;

const DOMAIN_NAME: &str = "ECDSAVerifier";
const DOMAIN_VERSION: &str = "1";

const IDENTITY_REGISTRATION_TYPE: &[u8] =
    b"IdentityRegistration(uint256 commitment,address wallet)";
const GAME_RUN_SUBMISSION_TYPE: &[u8] =
    b"GameRunSubmission(bytes32 runHash,uint256 extractionValue,uint256 identityCommitment,address player)";

/// Attestation signer holding the service's private signing key. Signing is
/// a pure function of (domain, message, key); there is no internal mutable
/// state.
pub struct AttestationSigner {
    wallet: LocalWallet,
    domain_separator: H256,
}

impl AttestationSigner {
    /// Create a signer from a private key (hex string with or without 0x
    /// prefix) and the verifier domain parameters.
    pub fn new(
        private_key: &str,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Result<Self, String> {
        let key_hex = private_key.strip_prefix("0x").unwrap_or(private_key);
        let key_bytes = hex::decode(key_hex)
            .map_err(|e| format!("Invalid private key hex: {}", e))?;

        let signing_key = SigningKey::from_bytes(key_bytes.as_slice().into())
            .map_err(|e| format!("Invalid private key: {}", e))?;

        let wallet = LocalWallet::from(signing_key).with_chain_id(chain_id);
        let domain_separator = domain_separator(chain_id, verifying_contract);

        Ok(Self {
            wallet,
            domain_separator,
        })
    }

    /// Get the signer address
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Sign an IdentityRegistration message
    pub fn sign_identity_registration(
        &self,
        commitment: U256,
        wallet: Address,
    ) -> Result<String, String> {
        self.sign_struct(identity_registration_struct_hash(commitment, wallet))
    }

    /// Sign a GameRunSubmission message
    pub fn sign_game_run_submission(
        &self,
        run_hash: H256,
        extraction_value: U256,
        identity_commitment: U256,
        player: Address,
    ) -> Result<String, String> {
        self.sign_struct(game_run_submission_struct_hash(
            run_hash,
            extraction_value,
            identity_commitment,
            player,
        ))
    }

    /// Final hash: keccak256("\x19\x01" ++ domainSeparator ++ structHash)
    fn eip712_digest(&self, struct_hash: H256) -> H256 {
        let mut to_sign = Vec::with_capacity(66);
        to_sign.push(0x19);
        to_sign.push(0x01);
        to_sign.extend_from_slice(self.domain_separator.as_bytes());
        to_sign.extend_from_slice(struct_hash.as_bytes());
        H256::from(keccak256(&to_sign))
    }

    fn sign_struct(&self, struct_hash: H256) -> Result<String, String> {
        let digest = self.eip712_digest(struct_hash);
        let signature = self
            .wallet
            .sign_hash(digest)
            .map_err(|e| format!("Failed to sign: {}", e))?;
        Ok(format!("0x{}", hex::encode(signature.to_vec())))
    }
}

fn identity_registration_struct_hash(commitment: U256, wallet: Address) -> H256 {
    let type_hash = keccak256(IDENTITY_REGISTRATION_TYPE);
    let encoded = ethers::abi::encode(&[
        Token::FixedBytes(type_hash.to_vec()),
        Token::Uint(commitment),
        Token::Address(wallet),
    ]);
    H256::from(keccak256(&encoded))
}

fn game_run_submission_struct_hash(
    run_hash: H256,
    extraction_value: U256,
    identity_commitment: U256,
    player: Address,
) -> H256 {
    let type_hash = keccak256(GAME_RUN_SUBMISSION_TYPE);
    let encoded = ethers::abi::encode(&[
        Token::FixedBytes(type_hash.to_vec()),
        Token::FixedBytes(run_hash.as_bytes().to_vec()),
        Token::Uint(extraction_value),
        Token::Uint(identity_commitment),
        Token::Address(player),
    ]);
    H256::from(keccak256(&encoded))
}

fn domain_separator(chain_id: u64, verifying_contract: Address) -> H256 {
    let type_hash = keccak256(
        b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
    );

    let name_hash = keccak256(DOMAIN_NAME.as_bytes());
    let version_hash = keccak256(DOMAIN_VERSION.as_bytes());

    let mut encoded = Vec::new();
    encoded.extend_from_slice(&type_hash);
    encoded.extend_from_slice(&name_hash);
    encoded.extend_from_slice(&version_hash);
    encoded.extend_from_slice(&ethers::abi::encode(&[Token::Uint(U256::from(chain_id))]));
    encoded.extend_from_slice(&ethers::abi::encode(&[Token::Address(verifying_contract)]));

    H256::from(keccak256(&encoded))
}
