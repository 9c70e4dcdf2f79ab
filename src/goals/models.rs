use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use std::fmt;
use uuid::Uuid;

/// Goal lifecycle status.
///
/// Active/PendingValidation goals are still in play; Completed and Failed are
/// terminal and are what resolution partitions into winners and losers.
/// Transitions are driven externally by the proof-validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "goal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    PendingValidation,
    Completed,
    Failed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::PendingValidation => "pending_validation",
            GoalStatus::Completed => "completed",
            GoalStatus::Failed => "failed",
        }
    }

    /// Terminal states never change again; resolution only ever reads them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GoalStatus::Completed | GoalStatus::Failed)
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "goal_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Learning,
    Work,
    Health,
}

impl GoalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalCategory::Learning => "learning",
            GoalCategory::Work => "work",
            GoalCategory::Health => "health",
        }
    }
}

/// Goal entity - a staked commitment against a deadline
///
/// Invariant: stake_amount > 0 (also enforced by a CHECK constraint).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: Uuid,
    /// Solana address of the staking participant
    pub wallet_address: String,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,

    #[serde(with = "rust_decimal::serde::float")]
    pub stake_amount: Decimal,

    /// Deposit transaction recorded when the stake entered escrow
    pub stake_tx_signature: String,
    pub status: GoalStatus,
    pub category: GoalCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn is_settled(&self) -> bool {
        self.status.is_terminal()
    }

    /// UTC calendar date of the deadline - the cohort key for resolution.
    pub fn deadline_date(&self) -> chrono::NaiveDate {
        self.deadline.date_naive()
    }
}

/// Optional filters for goal listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalFilter {
    pub wallet: Option<String>,
    pub status: Option<GoalStatus>,
    pub deadline: Option<chrono::NaiveDate>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!GoalStatus::Active.is_terminal());
        assert!(!GoalStatus::PendingValidation.is_terminal());
        assert!(GoalStatus::Completed.is_terminal());
        assert!(GoalStatus::Failed.is_terminal());
    }

    #[test]
    fn test_deadline_date_ignores_time_of_day() {
        use chrono::TimeZone;
        let morning = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap();
        assert_eq!(morning.date_naive(), night.date_naive());
    }
}
