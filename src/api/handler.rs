use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

use super::models::*;
use crate::{
    error::{AppError, AppResult},
    escrow::EscrowClient,
    goals::{models::GoalStatus, repository::GoalRepository},
    payouts::repository::PayoutRepository,
    rewards::trigger::{CohortPreview, ResolutionReport, ResolutionTrigger},
};

#[derive(Clone)]
pub struct AppState {
    pub goals: Arc<GoalRepository>,
    pub payouts: Arc<PayoutRepository>,
    pub escrow: Arc<dyn EscrowClient>,
    pub trigger: Arc<ResolutionTrigger>,
}

fn parse_deadline(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(format!("Invalid deadline '{}', expected YYYY-MM-DD", raw)))
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/v1/admin/rewards/preview?deadline=YYYY-MM-DD
///
/// Dry run: computed plans and cohort stats, no transfers.
pub async fn preview_rewards(
    State(state): State<AppState>,
    Query(query): Query<DeadlineQuery>,
) -> AppResult<Json<CohortPreview>> {
    let deadline = parse_deadline(&query.deadline)?;
    let preview = state.trigger.preview(deadline).await?;
    Ok(Json(preview))
}

/// POST /api/v1/admin/rewards
///
/// Commit a resolution run. Responds 200 even when some payouts fail:
/// partial failure is an expected operational outcome, expressed per item
/// in the payload for the operator to act on.
pub async fn trigger_rewards(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> AppResult<Json<ResolutionReport>> {
    let deadline = parse_deadline(&request.deadline)?;
    info!("Reward distribution triggered for deadline {}", deadline);

    let report = state.trigger.resolve(deadline).await?;
    Ok(Json(report))
}

/// POST /api/v1/admin/goals/sweep
///
/// Fail overdue active goals so their stakes join the next resolution pool.
pub async fn sweep_overdue_goals(State(state): State<AppState>) -> AppResult<Json<SweepResponse>> {
    let marked_failed = state.goals.mark_overdue_failed(Utc::now()).await?;
    if marked_failed > 0 {
        info!("Swept {} overdue goals to failed", marked_failed);
    }
    Ok(Json(SweepResponse { marked_failed }))
}

/// GET /api/v1/admin/escrow
///
/// Balance vs. the stake the escrow should still be holding.
pub async fn escrow_status(State(state): State<AppState>) -> AppResult<Json<EscrowHealthResponse>> {
    let balance = state.escrow.balance().await?;
    let outstanding_stake = state.goals.outstanding_stake().await?;

    let health_ratio = if outstanding_stake.is_zero() {
        Decimal::ONE
    } else {
        balance / outstanding_stake
    };

    Ok(Json(EscrowHealthResponse {
        address: state.escrow.address(),
        balance,
        outstanding_stake,
        health_ratio,
        is_healthy: health_ratio >= dec!(0.95),
    }))
}

/// GET /api/v1/analytics/platform
pub async fn platform_stats(
    State(state): State<AppState>,
) -> AppResult<Json<PlatformStatsResponse>> {
    let total_goals = state.goals.count_all().await?;
    let active_goals = state.goals.count_by_status(GoalStatus::Active).await?;
    let pending_validation_goals = state
        .goals
        .count_by_status(GoalStatus::PendingValidation)
        .await?;
    let completed_goals = state.goals.count_by_status(GoalStatus::Completed).await?;
    let failed_goals = state.goals.count_by_status(GoalStatus::Failed).await?;

    let settled = completed_goals + failed_goals;
    let completion_rate = if settled > 0 {
        (Decimal::from(completed_goals) * dec!(100) / Decimal::from(settled)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    Ok(Json(PlatformStatsResponse {
        total_goals,
        active_goals,
        pending_validation_goals,
        completed_goals,
        failed_goals,
        total_users: state.goals.distinct_wallets().await?,
        total_staked: state.goals.total_staked().await?,
        total_paid_out: state.payouts.total_paid_out().await?,
        completion_rate,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deadline() {
        assert_eq!(
            parse_deadline("2024-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert!(parse_deadline("June 1st").is_err());
        assert!(parse_deadline("2024-13-01").is_err());
    }
}
