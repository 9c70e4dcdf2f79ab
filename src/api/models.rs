use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Deadline day selector for preview/resolve, YYYY-MM-DD
#[derive(Debug, Deserialize)]
pub struct DeadlineQuery {
    pub deadline: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub deadline: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Escrow solvency against the stake it should still be holding
#[derive(Debug, Serialize)]
pub struct EscrowHealthResponse {
    pub address: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_stake: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub health_ratio: Decimal,

    pub is_healthy: bool,
}

#[derive(Debug, Serialize)]
pub struct PlatformStatsResponse {
    pub total_goals: i64,
    pub active_goals: i64,
    pub pending_validation_goals: i64,
    pub completed_goals: i64,
    pub failed_goals: i64,
    pub total_users: i64,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_staked: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid_out: Decimal,

    /// Share of settled goals that were completed, in percent
    #[serde(with = "rust_decimal::serde::float")]
    pub completion_rate: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub marked_failed: u64,
}
