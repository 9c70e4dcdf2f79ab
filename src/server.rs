use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    api::handler::{
        escrow_status, health_check, platform_stats, preview_rewards, sweep_overdue_goals,
        trigger_rewards, AppState,
    },
    goals::handlers::{create_goal, get_goal, list_goals, update_goal_status},
    payouts::handlers::{list_goal_payouts, list_wallet_payouts, wallet_payout_stats},
};

pub async fn create_app(state: AppState) -> Router {
    info!("Setting up HTTP routes...");

    let app = Router::new()
        // Public health check endpoint
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                // Goal endpoints
                .route("/goals", post(create_goal).get(list_goals))
                .route("/goals/:id", get(get_goal))
                .route("/goals/:id/status", patch(update_goal_status))
                // Payout endpoints
                .route("/payouts/goal/:goal_id", get(list_goal_payouts))
                .route("/payouts/wallet/:address", get(list_wallet_payouts))
                .route("/payouts/wallet/:address/stats", get(wallet_payout_stats))
                // Analytics endpoints
                .route("/analytics/platform", get(platform_stats))
                // Admin endpoints
                .route("/admin/rewards/preview", get(preview_rewards))
                .route("/admin/rewards", post(trigger_rewards))
                .route("/admin/goals/sweep", post(sweep_overdue_goals))
                .route("/admin/escrow", get(escrow_status)),
        )
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("✓ HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
