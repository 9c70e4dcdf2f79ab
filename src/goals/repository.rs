use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use super::models::{Goal, GoalCategory, GoalFilter, GoalStatus};
use super::GoalStore;
use crate::error::{AppResult, GoalError};

/// Postgres-backed goal repository
pub struct GoalRepository {
    pool: PgPool,
}

impl GoalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_goal(
        &self,
        wallet_address: String,
        title: String,
        description: String,
        deadline: DateTime<Utc>,
        stake_amount: Decimal,
        stake_tx_signature: String,
        category: GoalCategory,
    ) -> AppResult<Goal> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            INSERT INTO goals (
                wallet_address, title, description, deadline,
                stake_amount, stake_tx_signature, status, category
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'active', $7)
            RETURNING
                id, wallet_address, title, description, deadline,
                stake_amount, stake_tx_signature, status, category,
                created_at, updated_at
            "#,
        )
        .bind(wallet_address)
        .bind(title)
        .bind(description)
        .bind(deadline)
        .bind(stake_amount)
        .bind(stake_tx_signature)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        Ok(goal)
    }

    pub async fn get_goal(&self, goal_id: Uuid) -> AppResult<Option<Goal>> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, wallet_address, title, description, deadline,
                   stake_amount, stake_tx_signature, status, category,
                   created_at, updated_at
            FROM goals
            WHERE id = $1
            "#,
        )
        .bind(goal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(goal)
    }

    pub async fn list_goals(&self, filter: &GoalFilter) -> AppResult<Vec<Goal>> {
        let mut query: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, wallet_address, title, description, deadline, \
             stake_amount, stake_tx_signature, status, category, \
             created_at, updated_at FROM goals WHERE 1=1",
        );

        if let Some(wallet) = &filter.wallet {
            query.push(" AND wallet_address = ").push_bind(wallet);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(date) = filter.deadline {
            query
                .push(" AND (deadline AT TIME ZONE 'UTC')::date = ")
                .push_bind(date);
        }

        query.push(" ORDER BY created_at DESC");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
        }

        let goals = query.build_query_as::<Goal>().fetch_all(&self.pool).await?;
        Ok(goals)
    }

    /// Apply an externally-driven status transition. Terminal states are
    /// immutable: once a goal is completed or failed it stays that way.
    pub async fn update_status(&self, goal_id: Uuid, status: GoalStatus) -> AppResult<Goal> {
        let current = self
            .get_goal(goal_id)
            .await?
            .ok_or(GoalError::NotFound(goal_id))?;

        if current.status.is_terminal() {
            return Err(GoalError::TerminalState(goal_id).into());
        }

        let goal = sqlx::query_as::<_, Goal>(
            r#"
            UPDATE goals
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING
                id, wallet_address, title, description, deadline,
                stake_amount, stake_tx_signature, status, category,
                created_at, updated_at
            "#,
        )
        .bind(goal_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(goal)
    }

    /// Mark active goals whose deadline has passed as failed. Run by the
    /// operator before resolving a cohort so overdue stakes enter the pool.
    pub async fn mark_overdue_failed(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE goals
            SET status = 'failed', updated_at = now()
            WHERE status = 'active' AND deadline < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    // ========== AGGREGATES (analytics / escrow health) ==========

    pub async fn count_by_status(&self, status: GoalStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goals WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goals")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn total_staked(&self) -> AppResult<Decimal> {
        let total: Option<Decimal> = sqlx::query_scalar("SELECT SUM(stake_amount) FROM goals")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.unwrap_or(Decimal::ZERO))
    }

    /// Stake the escrow should still be holding: everything not yet settled.
    pub async fn outstanding_stake(&self) -> AppResult<Decimal> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(stake_amount) FROM goals WHERE status IN ('active', 'pending_validation')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total.unwrap_or(Decimal::ZERO))
    }

    pub async fn distinct_wallets(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT wallet_address) FROM goals")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[async_trait]
impl GoalStore for GoalRepository {
    async fn goals_with_deadline(&self, date: NaiveDate) -> AppResult<Vec<Goal>> {
        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, wallet_address, title, description, deadline,
                   stake_amount, stake_tx_signature, status, category,
                   created_at, updated_at
            FROM goals
            WHERE (deadline AT TIME ZONE 'UTC')::date = $1
            ORDER BY id ASC
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(goals)
    }
}
