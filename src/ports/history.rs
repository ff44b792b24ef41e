use chrono::{DateTime, Utc};

use crate::domain::{TransactionKind, TransactionRecord, UserId};

/// Append-only store of transaction records
#[mockall::automock]
#[async_trait::async_trait]
pub trait HistoryPort: Send + Sync {
    /// Append a new record and return it with its generated id
    async fn insert(
        &self,
        user_id: UserId,
        amount: u64,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
    ) -> Result<TransactionRecord, Error>;

    /// All records for the user in insertion order
    ///
    /// This returns an empty list for users without any records.
    async fn select_all(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
