use stakeledger::datasource::JsonRpcOracle;
use stakeledger::{
    api, config::Config, db::init_db, Indexer, IndexerSettings, OracleReader, Repository,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(Repository::new(pool));
    let oracle: Arc<dyn OracleReader> = Arc::new(JsonRpcOracle::new(
        config.oracle_rpc_url.clone(),
        config.token_contract.clone(),
        config.deposit_pool_contract.clone(),
    ));
    let indexer = Indexer::new(store, oracle, IndexerSettings::from(&config));

    let app = api::create_router(api::AppState::new(indexer));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        %addr,
        token = %config.token_contract,
        deposit_pool = %config.deposit_pool_contract,
        "stakeledger listening"
    );

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
