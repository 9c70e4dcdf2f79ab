use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::models::{PayoutRecord, WalletPayoutStats};
use crate::api::handler::AppState;
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
pub struct WalletPayoutQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/payouts/wallet/:address
pub async fn list_wallet_payouts(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<WalletPayoutQuery>,
) -> AppResult<Json<Vec<PayoutRecord>>> {
    let records = state.payouts.list_by_wallet(&address, query.limit).await?;
    Ok(Json(records))
}

/// GET /api/v1/payouts/wallet/:address/stats
pub async fn wallet_payout_stats(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<WalletPayoutStats>> {
    let stats = state.payouts.wallet_stats(&address).await?;
    Ok(Json(stats))
}

/// GET /api/v1/payouts/goal/:goal_id
pub async fn list_goal_payouts(
    State(state): State<AppState>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<Json<Vec<PayoutRecord>>> {
    let records = state.payouts.list_by_goal(goal_id).await?;
    Ok(Json(records))
}
