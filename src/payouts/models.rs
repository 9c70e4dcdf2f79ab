use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use uuid::Uuid;

/// Classification of a settled payout.
///
/// A payout carrying any redistributed reward is a CompletionReward; a pure
/// return of the winner's own stake (no losers that day) is OriginalStake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "payout_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutType {
    CompletionReward,
    OriginalStake,
}

impl PayoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutType::CompletionReward => "completion_reward",
            PayoutType::OriginalStake => "original_stake",
        }
    }
}

/// Settled outcome of one executed transfer. Created immediately after the
/// ledger confirms the transfer; never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PayoutRecord {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub wallet_address: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    pub tx_signature: String,
    pub payout_type: PayoutType,
    pub created_at: DateTime<Utc>,
}

impl PayoutRecord {
    pub fn new(
        goal_id: Uuid,
        wallet_address: String,
        amount: Decimal,
        tx_signature: String,
        payout_type: PayoutType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id,
            wallet_address,
            amount,
            tx_signature,
            payout_type,
            created_at: Utc::now(),
        }
    }
}

/// Per-wallet payout totals, split by type
#[derive(Debug, Clone, Serialize)]
pub struct WalletPayoutStats {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_payouts: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_rewards: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_stake_returns: Decimal,
    pub payout_count: i64,
}
