use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tracing::info;

use crate::{
    api::handler::AppState,
    config::Config,
    error::AppResult,
    escrow::{
        solana::{SolanaEscrowClient, SolanaEscrowConfig},
        EscrowClient,
    },
    goals::{repository::GoalRepository, GoalStore},
    payouts::{repository::PayoutRepository, PayoutStore},
    rewards::{executor::PayoutExecutor, trigger::ResolutionTrigger},
};

/// Construct every component once and wire them together explicitly. All
/// collaborators are plain values injected by reference; nothing is created
/// lazily behind a global.
pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let pool = initialize_database(&config.database_url).await?;

    let goals = Arc::new(GoalRepository::new(pool.clone()));
    let payouts = Arc::new(PayoutRepository::new(pool.clone()));
    info!("✓ Repositories initialized");

    let escrow_config = SolanaEscrowConfig {
        rpc_url: config.solana_rpc_url.clone(),
        ..SolanaEscrowConfig::default()
    };
    let escrow: Arc<dyn EscrowClient> = Arc::new(SolanaEscrowClient::from_env(escrow_config)?);
    info!("✓ Escrow wallet client initialized ({})", escrow.address());

    let executor = PayoutExecutor::new(
        escrow.clone(),
        payouts.clone() as Arc<dyn PayoutStore>,
    );
    let trigger = Arc::new(ResolutionTrigger::new(
        goals.clone() as Arc<dyn GoalStore>,
        executor,
    ));
    info!("✓ Resolution trigger initialized");

    Ok(AppState {
        goals,
        payouts,
        escrow,
        trigger,
    })
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(50)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("✓ Database initialized");
    Ok(pool)
}
