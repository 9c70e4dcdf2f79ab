use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{PayoutRecord, PayoutType, WalletPayoutStats};
use super::PayoutStore;
use crate::error::AppResult;

/// Postgres-backed payout ledger. The payouts table carries a UNIQUE
/// constraint on goal_id, so even racing resolution runs cannot record a
/// second payout for the same goal.
pub struct PayoutRepository {
    pool: PgPool,
}

impl PayoutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_wallet(
        &self,
        wallet_address: &str,
        limit: Option<i64>,
    ) -> AppResult<Vec<PayoutRecord>> {
        let records = sqlx::query_as::<_, PayoutRecord>(
            r#"
            SELECT id, goal_id, wallet_address, amount, tx_signature, payout_type, created_at
            FROM payouts
            WHERE wallet_address = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(wallet_address)
        .bind(limit.unwrap_or(100))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn list_by_goal(&self, goal_id: Uuid) -> AppResult<Vec<PayoutRecord>> {
        let records = sqlx::query_as::<_, PayoutRecord>(
            r#"
            SELECT id, goal_id, wallet_address, amount, tx_signature, payout_type, created_at
            FROM payouts
            WHERE goal_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(goal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn wallet_stats(&self, wallet_address: &str) -> AppResult<WalletPayoutStats> {
        let rows: Vec<(Decimal, PayoutType)> = sqlx::query_as(
            "SELECT amount, payout_type FROM payouts WHERE wallet_address = $1",
        )
        .bind(wallet_address)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = WalletPayoutStats {
            total_payouts: Decimal::ZERO,
            total_rewards: Decimal::ZERO,
            total_stake_returns: Decimal::ZERO,
            payout_count: 0,
        };

        for (amount, payout_type) in rows {
            stats.total_payouts += amount;
            stats.payout_count += 1;
            match payout_type {
                PayoutType::CompletionReward => stats.total_rewards += amount,
                PayoutType::OriginalStake => stats.total_stake_returns += amount,
            }
        }

        Ok(stats)
    }

    pub async fn total_paid_out(&self) -> AppResult<Decimal> {
        let total: Option<Decimal> = sqlx::query_scalar("SELECT SUM(amount) FROM payouts")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.unwrap_or(Decimal::ZERO))
    }
}

#[async_trait]
impl PayoutStore for PayoutRepository {
    async fn find_by_goal(&self, goal_id: Uuid) -> AppResult<Option<PayoutRecord>> {
        let record = sqlx::query_as::<_, PayoutRecord>(
            r#"
            SELECT id, goal_id, wallet_address, amount, tx_signature, payout_type, created_at
            FROM payouts
            WHERE goal_id = $1
            "#,
        )
        .bind(goal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn record(&self, record: &PayoutRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payouts (id, goal_id, wallet_address, amount, tx_signature, payout_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.goal_id)
        .bind(&record.wallet_address)
        .bind(record.amount)
        .bind(&record.tx_signature)
        .bind(record.payout_type)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
