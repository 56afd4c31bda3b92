use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;

mod canonical;
mod config;
mod controllers;
mod db;
mod faucet_tokens;
mod gatekeeper;
mod models;
mod web3;

use config::Config;
use db::Database;
use ethers::types::Address;
use gatekeeper::{AttestationSigner, Gatekeeper};
use web3::{RpcTokenMinter, RpcVerificationOracle, TokenMinter, VerificationOracle};

pub struct AppState {
    pub db: Arc<Database>,
    pub gatekeeper: Arc<Gatekeeper>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    // Token registry from the config directory (./config when run from the
    // workspace root, ../config when run from the member directory)
    let config_dir = if std::path::Path::new("./config").exists() {
        std::path::Path::new("./config")
    } else {
        std::path::Path::new("../config")
    };
    log::info!("Loading faucet token configs from {:?}", config_dir);
    faucet_tokens::load_defaults(config_dir);

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    // Stale rate-limit counters from a previous run carry no useful state
    match db.evict_expired_rate_counters(
        config.rate_limit_window_ms,
        chrono::Utc::now().timestamp_millis(),
    ) {
        Ok(evicted) if evicted > 0 => {
            log::info!("Evicted {} expired rate-limit counters", evicted)
        }
        Ok(_) => {}
        Err(e) => log::warn!("Failed to evict rate-limit counters: {}", e),
    }

    let verifier: Address = config
        .verifier_contract_address
        .parse()
        .expect("VERIFIER_CONTRACT_ADDRESS must be a valid address");
    let signer = AttestationSigner::new(&config.signer_private_key, config.chain_id, verifier)
        .expect("Failed to construct attestation signer");
    log::info!(
        "Attestation signer ready: {:?} (chain {})",
        signer.address(),
        config.chain_id
    );

    // Chain collaborators are optional; without an RPC endpoint the service
    // still signs, with the oracle treated as "don't know" and the faucet
    // reporting itself unconfigured
    let rpc_timeout = Duration::from_secs(config.rpc_timeout_secs);
    let oracle: Option<Arc<dyn VerificationOracle>> = match (
        config.rpc_url.as_deref(),
        config.identity_oracle_address.as_deref(),
    ) {
        (Some(rpc_url), Some(oracle_addr)) => {
            let contract: Address = oracle_addr
                .parse()
                .expect("IDENTITY_ORACLE_ADDRESS must be a valid address");
            log::info!("Verification oracle at {} via {}", oracle_addr, rpc_url);
            Some(Arc::new(RpcVerificationOracle::new(
                rpc_url,
                contract,
                rpc_timeout,
            )))
        }
        _ => {
            log::warn!("No verification oracle configured; runs are not gated on identity");
            None
        }
    };

    let minter: Option<Arc<dyn TokenMinter>> = match config.rpc_url.as_deref() {
        Some(rpc_url) => {
            let minter = RpcTokenMinter::new(
                rpc_url,
                &config.signer_private_key,
                config.chain_id,
                rpc_timeout,
            )
            .expect("Failed to construct token minter");
            log::info!("Faucet minter ready: {:?}", minter.address());
            Some(Arc::new(minter))
        }
        None => {
            log::warn!("No RPC endpoint configured; faucet disabled");
            None
        }
    };

    let gatekeeper = Arc::new(Gatekeeper::new(
        db.clone(),
        signer,
        oracle,
        minter,
        &config,
    ));

    log::info!("Starting attestor server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                gatekeeper: Arc::clone(&gatekeeper),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::identity::config)
            .configure(controllers::game::config)
            .configure(controllers::faucet::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
