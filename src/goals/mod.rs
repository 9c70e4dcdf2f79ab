pub mod handlers;
pub mod models;
pub mod repository;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use self::models::Goal;

/// Narrow read interface the resolution trigger needs. The Postgres
/// repository implements it; tests substitute an in-memory store.
#[async_trait]
pub trait GoalStore: Send + Sync {
    /// All goals whose deadline falls on the given UTC calendar date,
    /// regardless of status.
    async fn goals_with_deadline(&self, date: NaiveDate) -> AppResult<Vec<Goal>>;
}
