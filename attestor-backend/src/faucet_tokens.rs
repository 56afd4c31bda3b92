//! Faucet token registry - per-token decimals and contract addresses
//!
//! Loaded from `config/faucet_tokens.ron` at startup with built-in
//! defaults as fallback, then contract addresses are overridden from
//! `FAUCET_<SYMBOL>_ADDRESS` env vars so deployments can point at their
//! own contracts.

use ethers::types::U256;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Single token entry as stored in the RON config file.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
    /// Token decimals (6 for USDT, 18 for most ERC-20s)
    pub decimals: u8,
    /// Human-friendly token name
    pub display_name: String,
    /// Optional contract address
    pub address: Option<String>,
}

/// Runtime representation kept in the global.
#[derive(Debug, Clone)]
pub struct FaucetToken {
    pub decimals: u8,
    pub display_name: String,
    pub address: Option<String>,
}

// ---------------------------------------------------------------------------
// Global state
// ---------------------------------------------------------------------------

static TOKENS: RwLock<Option<HashMap<String, FaucetToken>>> = RwLock::new(None);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load token defaults from the RON config file, then apply env address
/// overrides. Called once at startup.
pub fn load_defaults(config_dir: &Path) {
    let path = config_dir.join("faucet_tokens.ron");
    let map = if path.exists() {
        match std::fs::read_to_string(&path) {
            Ok(content) => match ron::from_str::<HashMap<String, TokenEntry>>(&content) {
                Ok(parsed) => {
                    log::info!("[faucet_tokens] Loaded {} tokens from RON", parsed.len());
                    parsed
                        .into_iter()
                        .map(|(k, v)| {
                            (
                                k.to_uppercase(),
                                FaucetToken {
                                    decimals: v.decimals,
                                    display_name: v.display_name,
                                    address: v.address,
                                },
                            )
                        })
                        .collect()
                }
                Err(e) => {
                    log::error!("[faucet_tokens] Failed to parse RON config: {}", e);
                    builtin_defaults()
                }
            },
            Err(e) => {
                log::error!("[faucet_tokens] Failed to read config file: {}", e);
                builtin_defaults()
            }
        }
    } else {
        log::warn!("[faucet_tokens] Config file not found, using built-in defaults");
        builtin_defaults()
    };

    let symbols: Vec<String> = map.keys().cloned().collect();
    {
        let mut guard = TOKENS.write().unwrap();
        *guard = Some(map);
    }

    // Env overrides for contract addresses, e.g. FAUCET_USDT_ADDRESS
    for symbol in symbols {
        let var = format!("FAUCET_{}_ADDRESS", symbol);
        if let Ok(address) = std::env::var(&var) {
            if let Some(token) = get_token(&symbol) {
                log::info!("[faucet_tokens] {} address set from {}", symbol, var);
                set_token(&symbol, token.decimals, &token.display_name, Some(&address));
            }
        }
    }
}

/// Return the token for a symbol (case-insensitive). Falls back to the
/// built-in defaults when the registry has not been loaded (tests).
pub fn get_token(symbol: &str) -> Option<FaucetToken> {
    let guard = TOKENS.read().unwrap();
    match guard.as_ref() {
        Some(map) => map.get(&symbol.to_uppercase()).cloned(),
        None => builtin_defaults().get(&symbol.to_uppercase()).cloned(),
    }
}

/// Update (or insert) a single token at runtime.
pub fn set_token(symbol: &str, decimals: u8, display_name: &str, address: Option<&str>) {
    let mut guard = TOKENS.write().unwrap();
    let map = guard.get_or_insert_with(builtin_defaults);
    map.insert(
        symbol.to_uppercase(),
        FaucetToken {
            decimals,
            display_name: display_name.to_string(),
            address: address.map(|s| s.to_string()),
        },
    );
}

/// Scale a whole-token amount into raw units.
pub fn scaled_amount(whole: u64, decimals: u8) -> U256 {
    U256::from(whole) * U256::exp10(decimals as usize)
}

/// Human-friendly rendering of a raw-unit amount, for logs.
pub fn format_amount(raw: U256, decimals: u8) -> String {
    let divisor = U256::exp10(decimals as usize);
    let whole = raw / divisor;
    let frac = raw % divisor;
    if frac.is_zero() {
        format!("{}", whole)
    } else {
        let frac_str = format!("{:0>width$}", frac, width = decimals as usize)
            .trim_end_matches('0')
            .to_string();
        format!("{}.{}", whole, frac_str)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn builtin_defaults() -> HashMap<String, FaucetToken> {
    let mut map = HashMap::new();
    map.insert(
        "USDT".to_string(),
        FaucetToken {
            decimals: 6,
            display_name: "Test USDT".to_string(),
            address: None,
        },
    );
    map.insert(
        "METH".to_string(),
        FaucetToken {
            decimals: 18,
            display_name: "Test METH".to_string(),
            address: None,
        },
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_amount() {
        assert_eq!(scaled_amount(100, 6), U256::from(100_000_000u64));
        assert_eq!(
            scaled_amount(1, 18),
            U256::from_dec_str("1000000000000000000").unwrap()
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(U256::from(100_000_000u64), 6), "100");
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::zero(), 18), "0");
    }

    #[test]
    fn test_set_and_get_roundtrip() {
        // Use a symbol no other test touches; the registry is a process-wide global
        set_token("wxyz", 8, "Test WXYZ", Some("0x00000000000000000000000000000000000000aa"));
        let token = get_token("WXYZ").unwrap();
        assert_eq!(token.decimals, 8);
        assert_eq!(
            token.address.as_deref(),
            Some("0x00000000000000000000000000000000000000aa")
        );
        assert!(get_token("NOPE").is_none());
    }
}
