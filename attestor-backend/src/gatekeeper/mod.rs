//! Gatekeeper - composes canonicalization, admission control, the
//! idempotency ledger, the claim-window tracker and the attestation signer
//! into the four claim-processing protocols.
//!
//! Each protocol is a flat sequence of checks; the first failing check
//! short-circuits and becomes the single recorded outcome. Every terminal
//! outcome, success or failure, produces exactly one audit record.

pub mod error;
pub mod signer;

pub use error::GateError;
pub use signer::AttestationSigner;

use chrono::Utc;
use ethers::types::{Address, H256, U256};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::canonical;
use crate::config::Config;
use crate::db::Database;
use crate::faucet_tokens;
use crate::models::{FaucetRequest, SignGameRunRequest, SignIdentityRequest};
use crate::web3::{TokenMinter, VerificationOracle};

pub struct IdentityAttestation {
    pub wallet: String,
    pub signature: String,
}

pub struct RawRunDerivation {
    pub wallet: String,
    pub run_hash: String,
    pub extraction_value: u64,
}

pub struct RunAttestation {
    pub wallet: String,
    pub signature: String,
    pub run_hash: String,
    pub extraction_value: String,
    pub identity_commitment: String,
}

pub struct FaucetGrant {
    pub wallet: String,
    pub token: String,
    pub tx_hash: String,
    pub amount: String,
    pub balance: String,
    pub block_number: Option<u64>,
}

pub struct Gatekeeper {
    db: Arc<Database>,
    signer: AttestationSigner,
    oracle: Option<Arc<dyn VerificationOracle>>,
    minter: Option<Arc<dyn TokenMinter>>,
    rate_limit_max: u32,
    rate_limit_window_ms: i64,
    faucet_cooldown_ms: i64,
    faucet_amount: u64,
}

impl Gatekeeper {
    pub fn new(
        db: Arc<Database>,
        signer: AttestationSigner,
        oracle: Option<Arc<dyn VerificationOracle>>,
        minter: Option<Arc<dyn TokenMinter>>,
        config: &Config,
    ) -> Self {
        Self {
            db,
            signer,
            oracle,
            minter,
            rate_limit_max: config.rate_limit_max,
            rate_limit_window_ms: config.rate_limit_window_ms,
            faucet_cooldown_ms: config.faucet_cooldown_ms,
            faucet_amount: config.faucet_amount,
        }
    }

    /// Normalize a wallet string to (parsed address, canonical checksummed
    /// form). The checksummed form is the only representation used as a key.
    pub fn normalize_wallet(input: &str) -> Result<(Address, String), GateError> {
        let addr: Address = input
            .trim()
            .parse()
            .map_err(|_| GateError::Validation("invalid_wallet"))?;
        Ok((addr, ethers::utils::to_checksum(&addr, None)))
    }

    // -----------------------------------------------------------------------
    // Identity attestation
    // -----------------------------------------------------------------------

    pub async fn sign_identity(
        &self,
        req: &SignIdentityRequest,
    ) -> Result<IdentityAttestation, GateError> {
        let normalized = Self::normalize_wallet(&req.wallet);
        let audit_wallet = normalized.as_ref().ok().map(|(_, w)| w.clone());

        let result = match normalized {
            Ok((addr, wallet)) => self.sign_identity_checked(addr, &wallet, &req.commitment),
            Err(e) => Err(e),
        };

        match &result {
            Ok(out) => self.audit(
                "sign_identity",
                Some(&out.wallet),
                json!({ "commitment": req.commitment }),
                true,
            ),
            Err(e) => self.audit(
                "sign_identity",
                audit_wallet.as_deref(),
                json!({ "error": e.audit_detail() }),
                false,
            ),
        }
        result
    }

    fn sign_identity_checked(
        &self,
        addr: Address,
        wallet: &str,
        commitment: &str,
    ) -> Result<IdentityAttestation, GateError> {
        let commitment = U256::from_dec_str(commitment.trim())
            .map_err(|_| GateError::Validation("invalid_commitment"))?;

        self.check_rate(&format!("identity:{}", wallet))?;

        let commitment_str = commitment.to_string();
        let existing = self
            .db
            .get_identity(wallet)
            .map_err(|e| GateError::Internal(format!("identity lookup: {}", e)))?;

        if let Some(row) = existing {
            if row.verified {
                return Err(GateError::Conflict("already_verified"));
            }
            // Only identical-commitment resubmission is idempotent
            if row.commitment != commitment_str {
                return Err(GateError::Conflict("commitment_mismatch"));
            }
        }

        self.db
            .upsert_identity_commitment(wallet, &commitment_str, Utc::now())
            .map_err(|e| GateError::Internal(format!("identity upsert: {}", e)))?;

        let signature = self
            .signer
            .sign_identity_registration(commitment, addr)
            .map_err(GateError::Internal)?;

        Ok(IdentityAttestation {
            wallet: wallet.to_string(),
            signature,
        })
    }

    // -----------------------------------------------------------------------
    // Raw run derivation - derives only, never finalizes
    // -----------------------------------------------------------------------

    pub fn derive_raw_run(&self, payload: &Value) -> Result<RawRunDerivation, GateError> {
        let wallet_input = payload.get("wallet").and_then(|v| v.as_str());
        let normalized = match wallet_input {
            Some(w) => Self::normalize_wallet(w),
            None => Err(GateError::Validation("invalid_request")),
        };
        let audit_wallet = normalized.as_ref().ok().map(|(_, w)| w.clone());

        let result = match normalized {
            Ok((_, wallet)) => self.derive_raw_run_checked(&wallet, payload),
            Err(e) => Err(e),
        };

        match &result {
            Ok(out) => self.audit(
                "derive_raw_run",
                Some(&out.wallet),
                json!({ "runHash": out.run_hash, "extractionValue": out.extraction_value.to_string() }),
                true,
            ),
            Err(e) => self.audit(
                "derive_raw_run",
                audit_wallet.as_deref(),
                json!({ "error": e.audit_detail() }),
                false,
            ),
        }
        result
    }

    fn derive_raw_run_checked(
        &self,
        wallet: &str,
        payload: &Value,
    ) -> Result<RawRunDerivation, GateError> {
        let run_hash = canonical::hash_hex(payload);
        let extraction_value = canonical::extract_value(payload);

        self.db
            .insert_raw_run_record(
                wallet,
                &payload.to_string(),
                &run_hash,
                &extraction_value.to_string(),
                "valid",
                Utc::now(),
            )
            .map_err(|e| GateError::Internal(format!("raw run insert: {}", e)))?;

        Ok(RawRunDerivation {
            wallet: wallet.to_string(),
            run_hash,
            extraction_value,
        })
    }

    // -----------------------------------------------------------------------
    // Run attestation (finalize)
    // -----------------------------------------------------------------------

    pub async fn sign_game_run(
        &self,
        req: &SignGameRunRequest,
    ) -> Result<RunAttestation, GateError> {
        let normalized = Self::normalize_wallet(&req.wallet);
        let audit_wallet = normalized.as_ref().ok().map(|(_, w)| w.clone());

        let result = match normalized {
            Ok((addr, wallet)) => self.sign_game_run_checked(addr, &wallet, req).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(out) => self.audit(
                "sign_game_run",
                Some(&out.wallet),
                json!({
                    "runHash": out.run_hash,
                    "extractionValue": out.extraction_value,
                    "identityCommitment": out.identity_commitment
                }),
                true,
            ),
            Err(e) => self.audit(
                "sign_game_run",
                audit_wallet.as_deref(),
                json!({ "error": e.audit_detail(), "runHash": req.run_hash }),
                false,
            ),
        }
        result
    }

    async fn sign_game_run_checked(
        &self,
        addr: Address,
        wallet: &str,
        req: &SignGameRunRequest,
    ) -> Result<RunAttestation, GateError> {
        let run_hash = parse_run_hash(&req.run_hash)?;
        let extraction_value = U256::from_dec_str(req.extraction_value.trim())
            .map_err(|_| GateError::Validation("invalid_extraction_value"))?;
        let identity_commitment = U256::from_dec_str(req.identity_commitment.trim())
            .map_err(|_| GateError::Validation("invalid_identity_commitment"))?;

        self.check_rate(&format!("game:{}", wallet))?;

        // Fast duplicate path; the insert below is the authoritative check
        let run_hash_hex = format!("{:?}", run_hash);
        let exists = self
            .db
            .run_exists(&run_hash_hex)
            .map_err(|e| GateError::Internal(format!("run lookup: {}", e)))?;
        if exists {
            return Err(GateError::Conflict("duplicate_run"));
        }

        // When a raw payload is supplied, its derived hash and value must
        // both match the claimed ones exactly
        if let Some(raw) = &req.raw {
            if canonical::hash_hex(raw) != run_hash_hex {
                return Err(GateError::Validation("run_hash_mismatch"));
            }
            if U256::from(canonical::extract_value(raw)) != extraction_value {
                return Err(GateError::Validation("extraction_value_mismatch"));
            }
        }

        // Only an explicit false from the oracle blocks; an unconfigured
        // oracle or an unusable answer is "don't know"
        if let Some(oracle) = &self.oracle {
            match oracle.is_verified(addr).await {
                Ok(Some(false)) => return Err(GateError::NotVerified),
                Ok(_) => {}
                Err(e) => {
                    return Err(GateError::External(format!("verification oracle: {}", e)));
                }
            }
        }

        let signature = self
            .signer
            .sign_game_run_submission(run_hash, extraction_value, identity_commitment, addr)
            .map_err(GateError::Internal)?;

        let inserted = self
            .db
            .insert_run(
                &run_hash_hex,
                wallet,
                &extraction_value.to_string(),
                &identity_commitment.to_string(),
                "approved",
                Utc::now(),
            )
            .map_err(|e| GateError::Internal(format!("run insert: {}", e)))?;
        if !inserted {
            // Lost the race to a concurrent finalization of the same hash
            return Err(GateError::Conflict("duplicate_run"));
        }

        Ok(RunAttestation {
            wallet: wallet.to_string(),
            signature,
            run_hash: run_hash_hex,
            extraction_value: extraction_value.to_string(),
            identity_commitment: identity_commitment.to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Faucet claim
    // -----------------------------------------------------------------------

    pub async fn claim_faucet(
        &self,
        req: &FaucetRequest,
        source_ip: &str,
    ) -> Result<FaucetGrant, GateError> {
        let symbol = req
            .token
            .as_deref()
            .unwrap_or("USDT")
            .trim()
            .to_uppercase();

        let normalized = Self::normalize_wallet(&req.wallet);
        let audit_wallet = normalized.as_ref().ok().map(|(_, w)| w.clone());

        let result = self
            .claim_faucet_checked(&normalized, &symbol, source_ip)
            .await;

        match &result {
            Ok(out) => self.audit(
                "faucet_claim",
                Some(&out.wallet),
                json!({ "token": out.token, "amount": out.amount, "txHash": out.tx_hash }),
                true,
            ),
            Err(e) => self.audit(
                "faucet_claim",
                audit_wallet.as_deref(),
                json!({ "error": e.audit_detail(), "token": symbol }),
                false,
            ),
        }
        result
    }

    async fn claim_faucet_checked(
        &self,
        normalized: &Result<(Address, String), GateError>,
        symbol: &str,
        source_ip: &str,
    ) -> Result<FaucetGrant, GateError> {
        let minter = self.minter.as_ref().ok_or(GateError::FaucetNotConfigured)?;

        let token = faucet_tokens::get_token(symbol).ok_or(GateError::TokenNotConfigured)?;
        let token_addr: Address = token
            .address
            .as_deref()
            .ok_or(GateError::TokenNotConfigured)?
            .parse()
            .map_err(|_| GateError::Internal(format!("misconfigured {} address", symbol)))?;

        let (addr, wallet) = match normalized {
            Ok(pair) => pair.clone(),
            Err(GateError::Validation(tag)) => return Err(GateError::Validation(*tag)),
            Err(_) => return Err(GateError::Validation("invalid_wallet")),
        };

        self.check_rate(&format!("faucet:{}", source_ip))?;

        let now_ms = Utc::now().timestamp_millis();
        let eligible = self
            .db
            .faucet_claim_eligible(&wallet, symbol, self.faucet_cooldown_ms, now_ms)
            .map_err(|e| GateError::Internal(format!("claim lookup: {}", e)))?;
        if !eligible {
            return Err(GateError::CooldownActive);
        }

        let amount = faucet_tokens::scaled_amount(self.faucet_amount, token.decimals);
        let receipt = minter
            .mint(token_addr, addr, amount)
            .await
            .map_err(GateError::External)?;

        // Balance read is best-effort; the mint already confirmed
        let balance = match minter.balance_of(token_addr, addr).await {
            Ok(b) => b,
            Err(e) => {
                log::warn!("[gatekeeper] balance lookup after mint failed: {}", e);
                U256::zero()
            }
        };

        self.db
            .upsert_faucet_claim(&wallet, symbol, Utc::now())
            .map_err(|e| GateError::Internal(format!("claim upsert: {}", e)))?;

        log::info!(
            "[gatekeeper] faucet granted {} {} to {} (tx {})",
            faucet_tokens::format_amount(amount, token.decimals),
            symbol,
            wallet,
            receipt.tx_hash
        );

        Ok(FaucetGrant {
            wallet,
            token: symbol.to_string(),
            tx_hash: receipt.tx_hash,
            amount: amount.to_string(),
            balance: balance.to_string(),
            block_number: receipt.block_number,
        })
    }

    // -----------------------------------------------------------------------
    // Shared checks
    // -----------------------------------------------------------------------

    fn check_rate(&self, key: &str) -> Result<(), GateError> {
        let now_ms = Utc::now().timestamp_millis();
        let decision = self
            .db
            .check_rate_limit(key, self.rate_limit_max, self.rate_limit_window_ms, now_ms)
            .map_err(|e| GateError::Internal(format!("rate limit store: {}", e)))?;

        if decision.allowed {
            Ok(())
        } else {
            Err(GateError::RateLimited {
                retry_after_ms: decision.retry_after_ms.unwrap_or(self.rate_limit_window_ms),
            })
        }
    }

    fn audit(&self, event_type: &str, wallet: Option<&str>, details: Value, success: bool) {
        if let Err(e) = self.db.record_audit(event_type, wallet, &details, success) {
            log::error!("[gatekeeper] failed to write audit record: {}", e);
        }
    }
}

/// Parse a 0x-prefixed 64-hex-character run hash.
fn parse_run_hash(input: &str) -> Result<H256, GateError> {
    let trimmed = input.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .ok_or(GateError::Validation("invalid_run_hash"))?;
    if hex_part.len() != 64 {
        return Err(GateError::Validation("invalid_run_hash"));
    }
    let bytes = hex::decode(hex_part).map_err(|_| GateError::Validation("invalid_run_hash"))?;
    Ok(H256::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web3::MintReceipt;
    use async_trait::async_trait;
    use serde_json::json;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const WALLET: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn test_config() -> Config {
        Config {
            port: 0,
            database_url: ":memory:".to_string(),
            signer_private_key: TEST_KEY.to_string(),
            chain_id: 31611,
            verifier_contract_address: "0x1111111111111111111111111111111111111111".to_string(),
            rpc_url: None,
            identity_oracle_address: None,
            rate_limit_max: 100,
            rate_limit_window_ms: 60_000,
            faucet_cooldown_ms: 86_400_000,
            faucet_amount: 100,
            rpc_timeout_secs: 30,
        }
    }

    fn test_signer(config: &Config) -> AttestationSigner {
        let verifier: Address = config.verifier_contract_address.parse().unwrap();
        AttestationSigner::new(&config.signer_private_key, config.chain_id, verifier).unwrap()
    }

    fn gatekeeper_with(
        config: Config,
        oracle: Option<Arc<dyn VerificationOracle>>,
        minter: Option<Arc<dyn TokenMinter>>,
    ) -> Gatekeeper {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let signer = test_signer(&config);
        Gatekeeper::new(db, signer, oracle, minter, &config)
    }

    fn gatekeeper() -> Gatekeeper {
        gatekeeper_with(test_config(), None, None)
    }

    struct FixedOracle(Option<bool>);

    #[async_trait]
    impl VerificationOracle for FixedOracle {
        async fn is_verified(&self, _wallet: Address) -> Result<Option<bool>, String> {
            Ok(self.0)
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl VerificationOracle for FailingOracle {
        async fn is_verified(&self, _wallet: Address) -> Result<Option<bool>, String> {
            Err("rpc timeout".to_string())
        }
    }

    struct StubMinter;

    #[async_trait]
    impl TokenMinter for StubMinter {
        async fn mint(
            &self,
            _token: Address,
            _to: Address,
            _amount: U256,
        ) -> Result<MintReceipt, String> {
            Ok(MintReceipt {
                tx_hash: "0xfeed".to_string(),
                block_number: Some(7),
            })
        }

        async fn balance_of(&self, _token: Address, _owner: Address) -> Result<U256, String> {
            Ok(U256::from(100_000_000u64))
        }
    }

    // -- identity ----------------------------------------------------------

    #[tokio::test]
    async fn test_identity_register_idempotent_then_mismatch() {
        let gk = gatekeeper();
        let req = SignIdentityRequest {
            wallet: WALLET.to_string(),
            commitment: "12345".to_string(),
        };

        let first = gk.sign_identity(&req).await.unwrap();
        assert!(first.signature.starts_with("0x"));
        assert_eq!(first.signature.len(), 132);
        assert_eq!(first.wallet, WALLET);

        // Identical commitment: idempotent, same signature
        let again = gk.sign_identity(&req).await.unwrap();
        assert_eq!(again.signature, first.signature);

        // Different commitment for an unverified row: rejected
        let other = SignIdentityRequest {
            wallet: WALLET.to_string(),
            commitment: "99999".to_string(),
        };
        match gk.sign_identity(&other).await {
            Err(GateError::Conflict("commitment_mismatch")) => {}
            other => panic!("expected commitment_mismatch, got {:?}", other.err()),
        }
        // Stored commitment unchanged
        assert_eq!(gk.db.get_identity(WALLET).unwrap().unwrap().commitment, "12345");
    }

    #[tokio::test]
    async fn test_identity_already_verified() {
        let gk = gatekeeper();
        let req = SignIdentityRequest {
            wallet: WALLET.to_string(),
            commitment: "1".to_string(),
        };
        gk.sign_identity(&req).await.unwrap();

        // Verification happens out-of-core; flip the row directly
        gk.db
            .conn()
            .execute("UPDATE identities SET verified = 1 WHERE wallet = ?1", [WALLET])
            .unwrap();

        match gk.sign_identity(&req).await {
            Err(GateError::Conflict("already_verified")) => {}
            other => panic!("expected already_verified, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_identity_validation() {
        let gk = gatekeeper();

        let bad_wallet = SignIdentityRequest {
            wallet: "not-an-address".to_string(),
            commitment: "1".to_string(),
        };
        match gk.sign_identity(&bad_wallet).await {
            Err(GateError::Validation("invalid_wallet")) => {}
            other => panic!("expected invalid_wallet, got {:?}", other.err()),
        }

        // 2^256 overflows uint256
        let overflow = SignIdentityRequest {
            wallet: WALLET.to_string(),
            commitment:
                "115792089237316195423570985008687907853269984665640564039457584007913129639936"
                    .to_string(),
        };
        match gk.sign_identity(&overflow).await {
            Err(GateError::Validation("invalid_commitment")) => {}
            other => panic!("expected invalid_commitment, got {:?}", other.err()),
        }

        // 2^256 - 1 is in range
        let max = SignIdentityRequest {
            wallet: WALLET.to_string(),
            commitment:
                "115792089237316195423570985008687907853269984665640564039457584007913129639935"
                    .to_string(),
        };
        assert!(gk.sign_identity(&max).await.is_ok());
    }

    #[tokio::test]
    async fn test_identity_rate_limited() {
        let mut config = test_config();
        config.rate_limit_max = 1;
        let gk = gatekeeper_with(config, None, None);
        let req = SignIdentityRequest {
            wallet: WALLET.to_string(),
            commitment: "1".to_string(),
        };

        gk.sign_identity(&req).await.unwrap();
        match gk.sign_identity(&req).await {
            Err(GateError::RateLimited { retry_after_ms }) => assert!(retry_after_ms > 0),
            other => panic!("expected rate_limited, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_wallet_normalization_collapses_case() {
        let gk = gatekeeper();
        let lower = SignIdentityRequest {
            wallet: WALLET.to_lowercase(),
            commitment: "1".to_string(),
        };
        let checksummed = SignIdentityRequest {
            wallet: WALLET.to_string(),
            commitment: "1".to_string(),
        };

        let a = gk.sign_identity(&lower).await.unwrap();
        // Same wallet after normalization: idempotent, not a second row
        let b = gk.sign_identity(&checksummed).await.unwrap();
        assert_eq!(a.wallet, b.wallet);
        assert_eq!(a.wallet, WALLET);
    }

    // -- raw run derivation ------------------------------------------------

    #[test]
    fn test_derive_raw_run() {
        let gk = gatekeeper();
        let payload = json!({
            "wallet": WALLET,
            "sessionId": "s1",
            "events": [{"value": 3}, {"value": 2}]
        });

        let out = gk.derive_raw_run(&payload).unwrap();
        assert_eq!(out.run_hash, canonical::hash_hex(&payload));
        assert_eq!(out.extraction_value, 5);
        assert_eq!(gk.db.count_raw_run_records(&out.run_hash).unwrap(), 1);

        // Derivation never deduplicates
        gk.derive_raw_run(&payload).unwrap();
        assert_eq!(gk.db.count_raw_run_records(&out.run_hash).unwrap(), 2);
    }

    #[test]
    fn test_derive_raw_run_requires_wallet() {
        let gk = gatekeeper();
        match gk.derive_raw_run(&json!({"score": 10})) {
            Err(GateError::Validation("invalid_request")) => {}
            other => panic!("expected invalid_request, got {:?}", other.err()),
        }
    }

    // -- run attestation ---------------------------------------------------

    fn finalize_request(payload: &Value) -> SignGameRunRequest {
        SignGameRunRequest {
            wallet: WALLET.to_string(),
            run_hash: canonical::hash_hex(payload),
            extraction_value: canonical::extract_value(payload).to_string(),
            identity_commitment: "777".to_string(),
            raw: Some(payload.clone()),
        }
    }

    #[tokio::test]
    async fn test_sign_game_run_exactly_once() {
        let gk = gatekeeper();
        let payload = json!({"wallet": WALLET, "score": 42});
        let req = finalize_request(&payload);

        let out = gk.sign_game_run(&req).await.unwrap();
        assert!(out.signature.starts_with("0x"));
        assert_eq!(out.extraction_value, "42");
        assert!(gk.db.run_exists(&out.run_hash).unwrap());

        match gk.sign_game_run(&req).await {
            Err(GateError::Conflict("duplicate_run")) => {}
            other => panic!("expected duplicate_run, got {:?}", other.err()),
        }
        // No second row: the original is untouched
        let row = gk.db.get_run(&out.run_hash).unwrap().unwrap();
        assert_eq!(row.extraction_value, "42");
    }

    #[tokio::test]
    async fn test_sign_game_run_mismatches_leave_no_state() {
        let gk = gatekeeper();
        let payload = json!({"wallet": WALLET, "score": 42});

        let mut req = finalize_request(&payload);
        req.extraction_value = "41".to_string();
        match gk.sign_game_run(&req).await {
            Err(GateError::Validation("extraction_value_mismatch")) => {}
            other => panic!("expected extraction_value_mismatch, got {:?}", other.err()),
        }
        assert!(!gk.db.run_exists(&canonical::hash_hex(&payload)).unwrap());

        let mut req = finalize_request(&payload);
        req.run_hash =
            "0x2222222222222222222222222222222222222222222222222222222222222222".to_string();
        match gk.sign_game_run(&req).await {
            Err(GateError::Validation("run_hash_mismatch")) => {}
            other => panic!("expected run_hash_mismatch, got {:?}", other.err()),
        }
        assert!(!gk.db.run_exists(&req.run_hash).unwrap());
    }

    #[tokio::test]
    async fn test_sign_game_run_validates_hash_shape() {
        let gk = gatekeeper();
        for bad in ["deadbeef", "0x1234", "0xzz"] {
            let req = SignGameRunRequest {
                wallet: WALLET.to_string(),
                run_hash: bad.to_string(),
                extraction_value: "1".to_string(),
                identity_commitment: "1".to_string(),
                raw: None,
            };
            match gk.sign_game_run(&req).await {
                Err(GateError::Validation("invalid_run_hash")) => {}
                other => panic!("expected invalid_run_hash for {}, got {:?}", bad, other.err()),
            }
        }
    }

    #[tokio::test]
    async fn test_oracle_gating() {
        let payload = json!({"wallet": WALLET, "score": 1});

        // Explicit false denies
        let gk = gatekeeper_with(test_config(), Some(Arc::new(FixedOracle(Some(false)))), None);
        match gk.sign_game_run(&finalize_request(&payload)).await {
            Err(GateError::NotVerified) => {}
            other => panic!("expected identity_not_verified, got {:?}", other.err()),
        }

        // Unknown does not block
        let gk = gatekeeper_with(test_config(), Some(Arc::new(FixedOracle(None))), None);
        assert!(gk.sign_game_run(&finalize_request(&payload)).await.is_ok());

        // Oracle failure is an external-dependency failure, not a pass
        let gk = gatekeeper_with(test_config(), Some(Arc::new(FailingOracle)), None);
        match gk.sign_game_run(&finalize_request(&payload)).await {
            Err(GateError::External(detail)) => assert!(detail.contains("rpc timeout")),
            other => panic!("expected external failure, got {:?}", other.err()),
        }
    }

    // -- faucet ------------------------------------------------------------

    #[tokio::test]
    async fn test_faucet_not_configured() {
        let gk = gatekeeper();
        let req = FaucetRequest {
            wallet: WALLET.to_string(),
            token: None,
        };
        match gk.claim_faucet(&req, "1.2.3.4").await {
            Err(GateError::FaucetNotConfigured) => {}
            other => panic!("expected faucet_not_configured, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_faucet_token_not_configured() {
        let gk = gatekeeper_with(test_config(), None, Some(Arc::new(StubMinter)));

        // Unknown symbol
        let req = FaucetRequest {
            wallet: WALLET.to_string(),
            token: Some("FOO".to_string()),
        };
        match gk.claim_faucet(&req, "1.2.3.4").await {
            Err(GateError::TokenNotConfigured) => {}
            other => panic!("expected token_not_configured, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_faucet_claim_and_cooldown() {
        crate::faucet_tokens::set_token(
            "USDT",
            6,
            "Test USDT",
            Some("0x00000000000000000000000000000000000000bb"),
        );
        let gk = gatekeeper_with(test_config(), None, Some(Arc::new(StubMinter)));
        let req = FaucetRequest {
            wallet: WALLET.to_string(),
            token: None,
        };

        let grant = gk.claim_faucet(&req, "1.2.3.4").await.unwrap();
        assert_eq!(grant.token, "USDT");
        assert_eq!(grant.tx_hash, "0xfeed");
        assert_eq!(grant.amount, "100000000"); // 100 USDT at 6 decimals
        assert_eq!(grant.balance, "100000000");
        assert_eq!(grant.block_number, Some(7));
        assert!(gk.db.get_faucet_claim(WALLET, "USDT").unwrap().is_some());

        // Immediate second claim hits the cooldown
        match gk.claim_faucet(&req, "1.2.3.4").await {
            Err(GateError::CooldownActive) => {}
            other => panic!("expected already_claimed, got {:?}", other.err()),
        }
    }

    // -- audit -------------------------------------------------------------

    #[tokio::test]
    async fn test_every_outcome_is_audited() {
        let gk = gatekeeper();

        gk.sign_identity(&SignIdentityRequest {
            wallet: WALLET.to_string(),
            commitment: "1".to_string(),
        })
        .await
        .unwrap();

        let _ = gk
            .sign_identity(&SignIdentityRequest {
                wallet: "garbage".to_string(),
                commitment: "1".to_string(),
            })
            .await;

        let records = gk.db.list_audit_records(10).unwrap();
        assert_eq!(records.len(), 2);
        // Newest first: the failure, with no wallet (normalization failed)
        assert!(!records[0].success);
        assert!(records[0].wallet.is_none());
        assert!(records[0].details.contains("invalid_wallet"));
        assert!(records[1].success);
        assert_eq!(records[1].wallet.as_deref(), Some(WALLET));
    }

    // -- parsing -----------------------------------------------------------

    #[test]
    fn test_parse_run_hash() {
        let good = "0x1111111111111111111111111111111111111111111111111111111111111111";
        assert!(parse_run_hash(good).is_ok());
        assert!(parse_run_hash("0x11").is_err());
        assert!(parse_run_hash(&good[2..]).is_err());
    }
}
