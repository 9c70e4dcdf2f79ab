pub mod engine;
pub mod executor;
pub mod trigger;

/// In-memory fakes for the collaborator traits, shared by the executor and
/// trigger tests.
#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use std::collections::HashSet;
    use uuid::Uuid;

    use crate::error::AppResult;
    use crate::escrow::{EscrowClient, TransferError};
    use crate::goals::models::{Goal, GoalCategory, GoalStatus};
    use crate::goals::GoalStore;
    use crate::payouts::models::PayoutRecord;
    use crate::payouts::PayoutStore;

    pub fn goal_on(n: u8, stake: Decimal, status: GoalStatus, deadline: DateTime<Utc>) -> Goal {
        let id = Uuid::from_bytes([n; 16]);
        Goal {
            id,
            wallet_address: format!("wallet-{}", n),
            title: format!("goal {}", n),
            description: String::new(),
            deadline,
            stake_amount: stake,
            stake_tx_signature: format!("stake-sig-{}", n),
            status,
            category: GoalCategory::Learning,
            created_at: deadline - chrono::Duration::days(7),
            updated_at: deadline - chrono::Duration::days(7),
        }
    }

    pub fn goal_with_id(id: Uuid, stake: Decimal, status: GoalStatus) -> Goal {
        let n = id.as_bytes()[0];
        let deadline = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Goal {
            id,
            ..goal_on(n, stake, status, deadline)
        }
    }

    #[derive(Default)]
    pub struct FakeEscrow {
        balance: Mutex<Decimal>,
        sent: Mutex<Vec<(String, Decimal)>>,
        rejected: Mutex<HashSet<String>>,
        timed_out: Mutex<HashSet<String>>,
    }

    impl FakeEscrow {
        pub fn with_balance(balance: Decimal) -> Self {
            Self {
                balance: Mutex::new(balance),
                ..Default::default()
            }
        }

        pub fn reject_recipient(&self, recipient: &str) {
            self.rejected.lock().insert(recipient.to_string());
        }

        pub fn time_out_recipient(&self, recipient: &str) {
            self.timed_out.lock().insert(recipient.to_string());
        }

        /// Transfers that actually went out, in order.
        pub fn sent(&self) -> Vec<(String, Decimal)> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl EscrowClient for FakeEscrow {
        async fn balance(&self) -> AppResult<Decimal> {
            Ok(*self.balance.lock())
        }

        async fn send_value(
            &self,
            recipient: &str,
            amount: Decimal,
        ) -> Result<String, TransferError> {
            if self.rejected.lock().contains(recipient) {
                return Err(TransferError::rejected(format!(
                    "ledger rejected transfer to {}",
                    recipient
                )));
            }
            if self.timed_out.lock().contains(recipient) {
                return Err(TransferError::timeout(format!(
                    "confirmation timed out for {}",
                    recipient
                )));
            }

            let mut sent = self.sent.lock();
            sent.push((recipient.to_string(), amount));
            Ok(format!("sig-{}", sent.len()))
        }

        fn address(&self) -> String {
            "fake-escrow".to_string()
        }
    }

    pub struct FakeGoalStore {
        goals: Vec<Goal>,
    }

    impl FakeGoalStore {
        pub fn new(goals: Vec<Goal>) -> Self {
            Self { goals }
        }
    }

    #[async_trait]
    impl GoalStore for FakeGoalStore {
        async fn goals_with_deadline(&self, date: NaiveDate) -> AppResult<Vec<Goal>> {
            Ok(self
                .goals
                .iter()
                .filter(|g| g.deadline.date_naive() == date)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    pub struct FakePayoutStore {
        records: Mutex<Vec<PayoutRecord>>,
    }

    impl FakePayoutStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn records(&self) -> Vec<PayoutRecord> {
            self.records.lock().clone()
        }
    }

    #[async_trait]
    impl PayoutStore for FakePayoutStore {
        async fn find_by_goal(&self, goal_id: Uuid) -> AppResult<Option<PayoutRecord>> {
            Ok(self
                .records
                .lock()
                .iter()
                .find(|r| r.goal_id == goal_id)
                .cloned())
        }

        async fn record(&self, record: &PayoutRecord) -> AppResult<()> {
            self.records.lock().push(record.clone());
            Ok(())
        }
    }
}
