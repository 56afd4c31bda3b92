//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

pub mod audit_log; // audit_log (append-only gate decisions)
pub mod faucet_claims; // faucet_claims (per wallet+token cooldown)
pub mod identities; // identities (wallet commitments)
pub mod rate_limits; // rate_limit_counters (fixed-window admission)
pub mod runs; // runs, raw_run_records (idempotency ledger + raw log)
