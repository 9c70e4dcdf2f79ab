use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::models::{Goal, GoalCategory, GoalFilter, GoalStatus};
use crate::api::handler::AppState;
use crate::error::{AppError, AppResult, GoalError};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGoalRequest {
    pub wallet_address: String,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: String,

    pub deadline: DateTime<Utc>,

    #[serde(with = "rust_decimal::serde::float")]
    pub stake_amount: Decimal,

    /// Signature of the deposit transaction that moved the stake to escrow
    #[validate(length(min = 1))]
    pub stake_tx_signature: String,

    pub category: GoalCategory,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: GoalStatus,
}

/// POST /api/v1/goals
pub async fn create_goal(
    State(state): State<AppState>,
    Json(request): Json<CreateGoalRequest>,
) -> AppResult<Json<Goal>> {
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    if Pubkey::from_str(&request.wallet_address).is_err() {
        return Err(AppError::InvalidAddress(request.wallet_address));
    }

    if request.stake_amount <= Decimal::ZERO {
        return Err(GoalError::InvalidStake(request.stake_amount.to_string()).into());
    }

    if request.deadline <= Utc::now() {
        return Err(GoalError::InvalidDeadline(format!(
            "Deadline must be in the future, got {}",
            request.deadline
        ))
        .into());
    }

    let goal = state
        .goals
        .create_goal(
            request.wallet_address,
            request.title,
            request.description,
            request.deadline,
            request.stake_amount,
            request.stake_tx_signature,
            request.category,
        )
        .await?;

    info!("Goal created: {} ({} SOL staked)", goal.id, goal.stake_amount);
    Ok(Json(goal))
}

/// GET /api/v1/goals/:id
pub async fn get_goal(
    State(state): State<AppState>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<Json<Goal>> {
    let goal = state
        .goals
        .get_goal(goal_id)
        .await?
        .ok_or(GoalError::NotFound(goal_id))?;

    Ok(Json(goal))
}

/// GET /api/v1/goals?wallet=&status=&deadline=&limit=
pub async fn list_goals(
    State(state): State<AppState>,
    Query(filter): Query<GoalFilter>,
) -> AppResult<Json<Vec<Goal>>> {
    let goals = state.goals.list_goals(&filter).await?;
    Ok(Json(goals))
}

/// PATCH /api/v1/goals/:id/status
///
/// Status transitions are driven by the external proof-validation outcome;
/// this endpoint just applies them. Terminal states are immutable.
pub async fn update_goal_status(
    State(state): State<AppState>,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<Goal>> {
    let goal = state.goals.update_status(goal_id, request.status).await?;
    info!("Goal {} -> {}", goal.id, goal.status);
    Ok(Json(goal))
}
