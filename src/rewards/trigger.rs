use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::engine::{compute_payout_plans, PayoutPlan};
use super::executor::{ExecutionOutcome, PayoutExecutor};
use crate::error::AppResult;
use crate::goals::models::{Goal, GoalStatus};
use crate::goals::GoalStore;

/// Final state of one resolution run. There is no per-goal abort state: the
/// only whole-batch abort is the balance short-circuit, which leaves the run
/// at Computed (nothing executed, safe to retry after funding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Computed,
    Settled,
    PartiallySettled,
}

/// Aggregate cohort figures, identical in shape for preview and resolve so
/// the two are diffable.
#[derive(Debug, Clone, Serialize)]
pub struct CohortStats {
    pub total_goals: usize,
    pub completed: usize,
    pub failed: usize,
    pub active: usize,
    pub pending_validation: usize,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_completed_stake: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_failed_stake: Decimal,
}

/// Read-only dry run: what a resolution of this cohort would pay.
#[derive(Debug, Clone, Serialize)]
pub struct CohortPreview {
    pub deadline: NaiveDate,
    pub stats: CohortStats,
    pub plans: Vec<PayoutPlan>,
    pub can_distribute: bool,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// Per-goal result of a committing run.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutOutcome {
    pub goal_id: Uuid,
    pub recipient: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub original_stake: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub reward_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_payout: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub proportion: Decimal,

    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub deadline: NaiveDate,
    pub state: RunState,
    pub stats: CohortStats,

    /// Rewards actually settled in this run (excludes stake returns)
    #[serde(with = "rust_decimal::serde::float")]
    pub rewards_distributed: Decimal,

    pub outcomes: Vec<PayoutOutcome>,
    pub errors: Vec<String>,
    pub note: String,
}

struct Cohort {
    winners: Vec<Goal>,
    losers: Vec<Goal>,
    active: usize,
    pending_validation: usize,
}

impl Cohort {
    fn stats(&self) -> CohortStats {
        CohortStats {
            total_goals: self.winners.len()
                + self.losers.len()
                + self.active
                + self.pending_validation,
            completed: self.winners.len(),
            failed: self.losers.len(),
            active: self.active,
            pending_validation: self.pending_validation,
            total_completed_stake: self.winners.iter().map(|g| g.stake_amount).sum(),
            total_failed_stake: self.losers.iter().map(|g| g.stake_amount).sum(),
        }
    }

    fn note(&self) -> String {
        if self.winners.is_empty() {
            "No completed goals to reward; failed stakes remain in escrow".to_string()
        } else if self.losers.is_empty() {
            "No failed stakes to distribute; winners receive stake return only".to_string()
        } else {
            "Ready to distribute rewards".to_string()
        }
    }
}

/// Selects the cohort for a deadline date and drives preview or resolve.
///
/// A cohort is every goal whose deadline falls on the given UTC calendar
/// date, whatever the time of day. Completed goals are winners, Failed are
/// losers; Active and PendingValidation goals are reported but never paid.
pub struct ResolutionTrigger {
    goals: Arc<dyn GoalStore>,
    executor: PayoutExecutor,
}

impl ResolutionTrigger {
    pub fn new(goals: Arc<dyn GoalStore>, executor: PayoutExecutor) -> Self {
        Self { goals, executor }
    }

    async fn load_cohort(&self, deadline: NaiveDate) -> AppResult<Cohort> {
        let goals = self.goals.goals_with_deadline(deadline).await?;

        let mut cohort = Cohort {
            winners: Vec::new(),
            losers: Vec::new(),
            active: 0,
            pending_validation: 0,
        };

        for goal in goals {
            match goal.status {
                GoalStatus::Completed => cohort.winners.push(goal),
                GoalStatus::Failed => cohort.losers.push(goal),
                GoalStatus::Active => cohort.active += 1,
                GoalStatus::PendingValidation => cohort.pending_validation += 1,
            }
        }

        Ok(cohort)
    }

    /// Compute what a resolution would pay, with no side effects.
    pub async fn preview(&self, deadline: NaiveDate) -> AppResult<CohortPreview> {
        let cohort = self.load_cohort(deadline).await?;
        let plans = compute_payout_plans(&cohort.winners, &cohort.losers);

        Ok(CohortPreview {
            deadline,
            can_distribute: !cohort.winners.is_empty() && !cohort.losers.is_empty(),
            note: cohort.note(),
            stats: cohort.stats(),
            plans,
        })
    }

    /// Compute and execute the redistribution for a cohort. Partial failure
    /// is a normal outcome reported per goal, never an error; re-running is
    /// safe because settled goals are skipped.
    pub async fn resolve(&self, deadline: NaiveDate) -> AppResult<ResolutionReport> {
        let cohort = self.load_cohort(deadline).await?;
        let stats = cohort.stats();
        let note = cohort.note();

        info!(
            "Resolving cohort {}: {} completed, {} failed, {} not yet settled",
            deadline,
            stats.completed,
            stats.failed,
            stats.active + stats.pending_validation
        );

        let plans = compute_payout_plans(&cohort.winners, &cohort.losers);

        if plans.is_empty() {
            // Nothing to distribute. With zero winners the losing stakes
            // stay in escrow; no forfeiture or rollover policy applies.
            return Ok(ResolutionReport {
                deadline,
                state: RunState::Computed,
                stats,
                rewards_distributed: Decimal::ZERO,
                outcomes: Vec::new(),
                errors: Vec::new(),
                note,
            });
        }

        info!("Executing {} payout plans for {}", plans.len(), deadline);
        let outcome = self.executor.execute(&plans).await?;

        let state = if outcome.is_fully_settled() {
            RunState::Settled
        } else if outcome.was_short_circuited() {
            RunState::Computed
        } else {
            RunState::PartiallySettled
        };

        let report = Self::compose_report(deadline, state, stats, note, &plans, &outcome);
        info!(
            "Resolution for {} finished: {:?}, {} SOL in rewards settled",
            deadline, report.state, report.rewards_distributed
        );
        Ok(report)
    }

    fn compose_report(
        deadline: NaiveDate,
        state: RunState,
        stats: CohortStats,
        note: String,
        plans: &[PayoutPlan],
        outcome: &ExecutionOutcome,
    ) -> ResolutionReport {
        let mut outcomes = Vec::with_capacity(plans.len());
        let mut rewards_distributed = Decimal::ZERO;
        let mut errors = Vec::new();

        for plan in plans {
            if let Some(record) = outcome
                .succeeded
                .iter()
                .find(|r| r.goal_id == plan.goal_id)
            {
                rewards_distributed += plan.reward_share;
                outcomes.push(PayoutOutcome {
                    goal_id: plan.goal_id,
                    recipient: plan.recipient.clone(),
                    original_stake: plan.original_stake,
                    reward_amount: plan.reward_share,
                    total_payout: plan.total_payout,
                    proportion: plan.proportion,
                    status: OutcomeStatus::Success,
                    tx_signature: Some(record.tx_signature.clone()),
                    error: None,
                });
            } else if let Some(failure) = outcome
                .failed
                .iter()
                .find(|f| f.goal_id == plan.goal_id)
            {
                let reason = failure.reason.to_string();
                errors.push(format!("Failed to pay {}: {}", failure.recipient, reason));
                outcomes.push(PayoutOutcome {
                    goal_id: plan.goal_id,
                    recipient: plan.recipient.clone(),
                    original_stake: plan.original_stake,
                    reward_amount: plan.reward_share,
                    total_payout: plan.total_payout,
                    proportion: plan.proportion,
                    status: OutcomeStatus::Failed,
                    tx_signature: None,
                    error: Some(reason),
                });
            }
        }

        ResolutionReport {
            deadline,
            state,
            stats,
            rewards_distributed,
            outcomes,
            errors,
            note,
        }
    }
}
