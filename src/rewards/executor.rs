use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::engine::PayoutPlan;
use crate::error::AppResult;
use crate::escrow::{EscrowClient, TransferErrorKind};
use crate::payouts::models::PayoutRecord;
use crate::payouts::PayoutStore;

/// Why a planned payout did not settle in this run.
#[derive(Error, Debug, Clone)]
pub enum FailureReason {
    #[error("Insufficient escrow balance: required {required}, available {available}")]
    InsufficientEscrowBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("Transfer rejected: {0}")]
    TransferRejected(String),

    #[error("Transfer timed out: {0}")]
    TransferTimeout(String),
}

#[derive(Debug, Clone)]
pub struct FailedPayout {
    pub goal_id: Uuid,
    pub recipient: String,
    pub amount: Decimal,
    pub reason: FailureReason,
}

#[derive(Debug, Default)]
pub struct ExecutionOutcome {
    pub succeeded: Vec<PayoutRecord>,
    pub failed: Vec<FailedPayout>,
}

impl ExecutionOutcome {
    pub fn is_fully_settled(&self) -> bool {
        self.failed.is_empty()
    }

    /// True when the balance pre-check aborted the batch before any transfer.
    pub fn was_short_circuited(&self) -> bool {
        self.succeeded.is_empty()
            && self
                .failed
                .iter()
                .all(|f| matches!(f.reason, FailureReason::InsufficientEscrowBalance { .. }))
            && !self.failed.is_empty()
    }
}

/// Drives a batch of payout plans against the escrow, one transfer at a time.
///
/// The escrow is a single shared signer, so transfers are strictly
/// sequential and issued in ascending goal-id order; a repeated run retries
/// in the same order. Each successful transfer is persisted before the next
/// one is sent, and goals that already have a payout record are skipped
/// entirely, which makes re-running a resolution safe.
pub struct PayoutExecutor {
    escrow: Arc<dyn EscrowClient>,
    payouts: Arc<dyn PayoutStore>,
}

impl PayoutExecutor {
    pub fn new(escrow: Arc<dyn EscrowClient>, payouts: Arc<dyn PayoutStore>) -> Self {
        Self { escrow, payouts }
    }

    pub async fn execute(&self, plans: &[PayoutPlan]) -> AppResult<ExecutionOutcome> {
        let mut outcome = ExecutionOutcome::default();
        if plans.is_empty() {
            return Ok(outcome);
        }

        let mut ordered: Vec<&PayoutPlan> = plans.iter().collect();
        ordered.sort_by_key(|p| p.goal_id);

        // Abort before any transfer if the escrow cannot cover the whole
        // batch. A partial drain would strand whoever came last in the order.
        let required: Decimal = ordered.iter().map(|p| p.total_payout).sum();
        let available = self.escrow.balance().await?;

        if available < required {
            warn!(
                "Escrow balance too low for batch: required {}, available {}",
                required, available
            );
            for plan in ordered {
                outcome.failed.push(FailedPayout {
                    goal_id: plan.goal_id,
                    recipient: plan.recipient.clone(),
                    amount: plan.total_payout,
                    reason: FailureReason::InsufficientEscrowBalance {
                        required,
                        available,
                    },
                });
            }
            return Ok(outcome);
        }

        info!(
            "Executing {} payouts, {} SOL total",
            ordered.len(),
            required
        );

        for plan in ordered {
            // Already paid in an earlier run: count it as settled, send nothing.
            if let Some(existing) = self.payouts.find_by_goal(plan.goal_id).await? {
                info!(
                    "Goal {} already paid ({}), skipping transfer",
                    plan.goal_id, existing.tx_signature
                );
                outcome.succeeded.push(existing);
                continue;
            }

            match self
                .escrow
                .send_value(&plan.recipient, plan.total_payout)
                .await
            {
                Ok(tx_signature) => {
                    let record = PayoutRecord::new(
                        plan.goal_id,
                        plan.recipient.clone(),
                        plan.total_payout,
                        tx_signature,
                        plan.payout_type(),
                    );

                    // Write-after-send: the transfer is already on the ledger,
                    // so a failed write only loses the record, not the money.
                    // Reconciliation is by transaction id.
                    if let Err(e) = self.payouts.record(&record).await {
                        error!(
                            "Payout for goal {} sent ({}) but not recorded: {}",
                            record.goal_id, record.tx_signature, e
                        );
                    }
                    outcome.succeeded.push(record);
                }
                Err(transfer_err) => {
                    let reason = match transfer_err.kind {
                        TransferErrorKind::Timeout => {
                            FailureReason::TransferTimeout(transfer_err.message)
                        }
                        TransferErrorKind::Rejected => {
                            FailureReason::TransferRejected(transfer_err.message)
                        }
                    };
                    warn!("Payout for goal {} failed: {}", plan.goal_id, reason);
                    outcome.failed.push(FailedPayout {
                        goal_id: plan.goal_id,
                        recipient: plan.recipient.clone(),
                        amount: plan.total_payout,
                        reason,
                    });
                }
            }
        }

        info!(
            "Payout batch done: {} succeeded, {} failed",
            outcome.succeeded.len(),
            outcome.failed.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::models::GoalStatus;
    use crate::payouts::models::PayoutType;
    use crate::rewards::engine::compute_payout_plans;
    use crate::rewards::testing::{goal_with_id, FakeEscrow, FakePayoutStore};
    use rust_decimal_macros::dec;

    fn uid(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    fn plans_for(stakes: &[(u8, Decimal)], loser_stake: Decimal) -> Vec<PayoutPlan> {
        let winners: Vec<_> = stakes
            .iter()
            .map(|(n, s)| goal_with_id(uid(*n), *s, GoalStatus::Completed))
            .collect();
        let losers = vec![goal_with_id(uid(200), loser_stake, GoalStatus::Failed)];
        compute_payout_plans(&winners, &losers)
    }

    #[tokio::test]
    async fn test_insufficient_balance_short_circuits() {
        let escrow = Arc::new(FakeEscrow::with_balance(dec!(0.5)));
        let store = Arc::new(FakePayoutStore::new());
        let executor = PayoutExecutor::new(escrow.clone(), store.clone());

        let plans = plans_for(&[(1, dec!(0.5)), (2, dec!(0.5))], dec!(1.0));
        let outcome = executor.execute(&plans).await.unwrap();

        assert!(outcome.succeeded.is_empty());
        assert_eq!(outcome.failed.len(), 2);
        assert!(outcome.was_short_circuited());
        for failure in &outcome.failed {
            assert!(matches!(
                failure.reason,
                FailureReason::InsufficientEscrowBalance { .. }
            ));
        }
        // zero transfers attempted
        assert!(escrow.sent().is_empty());
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let escrow = Arc::new(FakeEscrow::with_balance(dec!(100)));
        escrow.reject_recipient("wallet-2");
        let store = Arc::new(FakePayoutStore::new());
        let executor = PayoutExecutor::new(escrow.clone(), store.clone());

        let plans = plans_for(&[(1, dec!(1.0)), (2, dec!(1.0)), (3, dec!(1.0))], dec!(3.0));
        let outcome = executor.execute(&plans).await.unwrap();

        assert_eq!(outcome.succeeded.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert!(!outcome.is_fully_settled());
        assert!(!outcome.was_short_circuited());
        assert_eq!(outcome.failed[0].recipient, "wallet-2");
        assert!(matches!(
            outcome.failed[0].reason,
            FailureReason::TransferRejected(_)
        ));

        // non-failing payouts neither skipped nor duplicated
        assert_eq!(escrow.sent().len(), 2);
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_its_own_failure_kind() {
        let escrow = Arc::new(FakeEscrow::with_balance(dec!(100)));
        escrow.time_out_recipient("wallet-1");
        let store = Arc::new(FakePayoutStore::new());
        let executor = PayoutExecutor::new(escrow, store);

        let plans = plans_for(&[(1, dec!(1.0))], dec!(0.5));
        let outcome = executor.execute(&plans).await.unwrap();

        assert!(matches!(
            outcome.failed[0].reason,
            FailureReason::TransferTimeout(_)
        ));
    }

    #[tokio::test]
    async fn test_already_paid_goal_is_skipped() {
        let escrow = Arc::new(FakeEscrow::with_balance(dec!(100)));
        let store = Arc::new(FakePayoutStore::new());
        let executor = PayoutExecutor::new(escrow.clone(), store.clone());

        let plans = plans_for(&[(1, dec!(1.0)), (2, dec!(1.0))], dec!(2.0));

        // goal 1 settled in an earlier run
        let existing = PayoutRecord::new(
            plans[0].goal_id,
            plans[0].recipient.clone(),
            plans[0].total_payout,
            "earlier-signature".to_string(),
            PayoutType::CompletionReward,
        );
        store.record(&existing).await.unwrap();

        let outcome = executor.execute(&plans).await.unwrap();

        assert_eq!(outcome.succeeded.len(), 2);
        assert!(outcome.failed.is_empty());
        // only goal 2's transfer went out
        assert_eq!(escrow.sent().len(), 1);
        assert_eq!(escrow.sent()[0].0, plans[1].recipient);
        // the pre-existing record is reported, not rewritten
        assert_eq!(outcome.succeeded[0].tx_signature, "earlier-signature");
    }

    #[tokio::test]
    async fn test_rerun_sends_nothing_new() {
        let escrow = Arc::new(FakeEscrow::with_balance(dec!(100)));
        let store = Arc::new(FakePayoutStore::new());
        let executor = PayoutExecutor::new(escrow.clone(), store.clone());

        let plans = plans_for(&[(1, dec!(0.5)), (2, dec!(1.5))], dec!(1.0));

        let first = executor.execute(&plans).await.unwrap();
        assert_eq!(first.succeeded.len(), 2);
        let sends_after_first = escrow.sent().len();

        let second = executor.execute(&plans).await.unwrap();
        assert_eq!(second.succeeded.len(), 2);
        assert!(second.failed.is_empty());
        assert_eq!(escrow.sent().len(), sends_after_first);

        // identical records both times
        let first_sigs: Vec<_> = first.succeeded.iter().map(|r| r.tx_signature.clone()).collect();
        let second_sigs: Vec<_> = second.succeeded.iter().map(|r| r.tx_signature.clone()).collect();
        assert_eq!(first_sigs, second_sigs);
    }

    #[tokio::test]
    async fn test_transfers_issued_in_goal_id_order() {
        let escrow = Arc::new(FakeEscrow::with_balance(dec!(100)));
        let store = Arc::new(FakePayoutStore::new());
        let executor = PayoutExecutor::new(escrow.clone(), store);

        // engine already sorts, so hand the executor a shuffled slice
        let winners: Vec<_> = [3u8, 1, 2]
            .iter()
            .map(|n| goal_with_id(uid(*n), dec!(1.0), GoalStatus::Completed))
            .collect();
        let mut plans = compute_payout_plans(&winners, &[]);
        plans.reverse();

        executor.execute(&plans).await.unwrap();

        let sent = escrow.sent();
        assert_eq!(sent[0].0, format!("wallet-{}", 1));
        assert_eq!(sent[1].0, format!("wallet-{}", 2));
        assert_eq!(sent[2].0, format!("wallet-{}", 3));
    }
}
