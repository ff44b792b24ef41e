use crate::domain::{PointBalance, UserId};

/// Store of the cached balance per user
#[mockall::automock]
#[async_trait::async_trait]
pub trait BalancePort: Send + Sync {
    /// Current snapshot, or a zero balance if the user was never stored
    async fn select_by_id(&self, user_id: UserId) -> Result<PointBalance, Error>;

    /// Overwrite the snapshot for the user, stamped with the current time
    async fn insert_or_update(&self, user_id: UserId, point: u64) -> Result<PointBalance, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Concrete adapter errors
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
