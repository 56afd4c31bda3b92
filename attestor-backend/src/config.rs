use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const SIGNER_PRIVATE_KEY: &str = "SIGNER_PRIVATE_KEY";
    pub const CHAIN_ID: &str = "CHAIN_ID";
    pub const VERIFIER_CONTRACT_ADDRESS: &str = "VERIFIER_CONTRACT_ADDRESS";
    pub const RPC_URL: &str = "RPC_URL";
    pub const IDENTITY_ORACLE_ADDRESS: &str = "IDENTITY_ORACLE_ADDRESS";
    pub const RATE_LIMIT_MAX: &str = "RATE_LIMIT_MAX";
    pub const RATE_LIMIT_WINDOW_MS: &str = "RATE_LIMIT_WINDOW_MS";
    pub const FAUCET_COOLDOWN_MS: &str = "FAUCET_COOLDOWN_MS";
    pub const FAUCET_AMOUNT: &str = "FAUCET_AMOUNT";
    pub const RPC_TIMEOUT_SECS: &str = "RPC_TIMEOUT_SECS";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/attestor.db";
    pub const CHAIN_ID: u64 = 5151706;
    pub const RATE_LIMIT_MAX: u32 = 10;
    pub const RATE_LIMIT_WINDOW_MS: i64 = 60_000;
    pub const FAUCET_COOLDOWN_MS: i64 = 86_400_000;
    /// Whole-token units minted per faucet claim (scaled by token decimals)
    pub const FAUCET_AMOUNT: u64 = 100;
    pub const RPC_TIMEOUT_SECS: u64 = 30;
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub signer_private_key: String,
    pub chain_id: u64,
    pub verifier_contract_address: String,
    pub rpc_url: Option<String>,
    pub identity_oracle_address: Option<String>,
    pub rate_limit_max: u32,
    pub rate_limit_window_ms: i64,
    pub faucet_cooldown_ms: i64,
    pub faucet_amount: u64,
    pub rpc_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            signer_private_key: env::var(env_vars::SIGNER_PRIVATE_KEY)
                .expect("SIGNER_PRIVATE_KEY must be set - the service cannot attest without it"),
            chain_id: env::var(env_vars::CHAIN_ID)
                .unwrap_or_else(|_| defaults::CHAIN_ID.to_string())
                .parse()
                .expect("CHAIN_ID must be a valid number"),
            verifier_contract_address: env::var(env_vars::VERIFIER_CONTRACT_ADDRESS)
                .expect("VERIFIER_CONTRACT_ADDRESS must be set - it anchors the signing domain"),
            rpc_url: env::var(env_vars::RPC_URL).ok(),
            identity_oracle_address: env::var(env_vars::IDENTITY_ORACLE_ADDRESS).ok(),
            rate_limit_max: env::var(env_vars::RATE_LIMIT_MAX)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::RATE_LIMIT_MAX),
            rate_limit_window_ms: env::var(env_vars::RATE_LIMIT_WINDOW_MS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::RATE_LIMIT_WINDOW_MS),
            faucet_cooldown_ms: env::var(env_vars::FAUCET_COOLDOWN_MS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::FAUCET_COOLDOWN_MS),
            faucet_amount: env::var(env_vars::FAUCET_AMOUNT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::FAUCET_AMOUNT),
            rpc_timeout_secs: env::var(env_vars::RPC_TIMEOUT_SECS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::RPC_TIMEOUT_SECS),
        }
    }
}
