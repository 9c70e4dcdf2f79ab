pub mod handlers;
pub mod models;
pub mod repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use self::models::PayoutRecord;

/// Append-only payout ledger. `find_by_goal` is the idempotency check the
/// executor runs before every transfer; records are written once and never
/// mutated.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    async fn find_by_goal(&self, goal_id: Uuid) -> AppResult<Option<PayoutRecord>>;

    async fn record(&self, record: &PayoutRecord) -> AppResult<()>;
}
