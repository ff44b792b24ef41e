use crate::{
    domain::{PointBalance, RecordId, TransactionKind, TransactionRecord, UserId},
    ports::{
        balance::{self, BalancePort},
        history::{self, HistoryPort},
    },
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// In-process database backing both the history and the balance ports
///
/// Clones share the same underlying tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    history: Arc<Mutex<HistoryTable>>,
    balances: Arc<Mutex<HashMap<UserId, PointBalance>>>,
}

#[derive(Debug, Default)]
struct HistoryTable {
    last_id: RecordId,
    records: Vec<TransactionRecord>,
}

#[async_trait::async_trait]
impl HistoryPort for MemoryDatabase {
    async fn insert(
        &self,
        user_id: UserId,
        amount: u64,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
    ) -> Result<TransactionRecord, history::Error> {
        let mut table = self.history.lock()?;
        table.last_id += 1;
        let record = TransactionRecord {
            id: table.last_id,
            user_id,
            amount,
            kind,
            occurred_at,
        };
        table.records.push(record.clone());

        Ok(record)
    }

    async fn select_all(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, history::Error> {
        let records = self
            .history
            .lock()?
            .records
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();

        Ok(records)
    }
}

#[async_trait::async_trait]
impl BalancePort for MemoryDatabase {
    async fn select_by_id(&self, user_id: UserId) -> Result<PointBalance, balance::Error> {
        let balance = self
            .balances
            .lock()?
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| PointBalance::new(user_id));

        Ok(balance)
    }

    async fn insert_or_update(
        &self,
        user_id: UserId,
        point: u64,
    ) -> Result<PointBalance, balance::Error> {
        let balance = PointBalance {
            user_id,
            point,
            updated_at: Utc::now(),
        };
        self.balances.lock()?.insert(user_id, balance.clone());

        Ok(balance)
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for history::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}

impl<T> From<PoisonError<T>> for balance::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[tokio::test]
    async fn test_insert_select_all() {
        let database = MemoryDatabase::default();
        let now = Utc::now();
        database
            .insert(1, 1000, TransactionKind::Charge, now)
            .await
            .unwrap();
        database
            .insert(2, 500, TransactionKind::Charge, now)
            .await
            .unwrap();
        database
            .insert(1, 200, TransactionKind::Use, now)
            .await
            .unwrap();

        // Only the records of the requested user, in insertion order
        let res = database.select_all(1).await;
        assert_that!(res).is_ok().matches(|records| {
            records.len() == 2
                && records[0].amount == 1000
                && records[0].kind == TransactionKind::Charge
                && records[1].amount == 200
                && records[1].kind == TransactionKind::Use
        });
    }

    #[tokio::test]
    async fn test_insert_generates_increasing_ids() {
        let database = MemoryDatabase::default();
        let first = database
            .insert(1, 10, TransactionKind::Charge, Utc::now())
            .await
            .unwrap();
        let second = database
            .insert(2, 10, TransactionKind::Charge, Utc::now())
            .await
            .unwrap();

        assert_that!(second.id).is_greater_than(first.id);
    }

    #[tokio::test]
    async fn test_select_all_empty() {
        let database = MemoryDatabase::default();

        let res = database.select_all(42).await;
        assert_that!(res).is_ok().has_length(0);
    }

    #[tokio::test]
    async fn test_select_by_id_default() {
        let database = MemoryDatabase::default();

        let res = database.select_by_id(42).await;
        assert_that!(res)
            .is_ok()
            .matches(|balance| balance.user_id == 42 && balance.point == 0);
    }

    #[tokio::test]
    async fn test_insert_or_update_overwrites() {
        let database = MemoryDatabase::default();
        database.insert_or_update(1, 3000).await.unwrap();
        database.insert_or_update(1, 1200).await.unwrap();

        // Retrieving the balance should return the last written value
        let res = database.select_by_id(1).await;
        assert_that!(res)
            .is_ok()
            .matches(|balance| balance.user_id == 1 && balance.point == 1200);
    }

    #[tokio::test]
    async fn test_clones_share_tables() {
        let database = MemoryDatabase::default();
        let other = database.clone();
        other.insert_or_update(7, 55).await.unwrap();

        let res = database.select_by_id(7).await;
        assert_that!(res).is_ok().matches(|balance| balance.point == 55);
    }
}
