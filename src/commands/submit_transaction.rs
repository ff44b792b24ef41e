use std::task::{Context, Poll};

use crate::{
    domain::{PointBalance, TransactionKind, TransactionRecord, UserId},
    ports::{balance::BalancePort, history::HistoryPort},
};
use chrono::{DateTime, Utc};
use tower::Service;

use super::{DomainLogic, Error, ServiceFuture};

#[derive(Clone, Debug)]
pub struct SubmitTransactionRequest {
    pub user_id: UserId,
    /// Must be positive
    pub amount: u64,
    pub kind: TransactionKind,
    pub occurred_at: DateTime<Utc>,
}

impl SubmitTransactionRequest {
    pub fn charge(user_id: UserId, amount: u64) -> Self {
        Self {
            user_id,
            amount,
            kind: TransactionKind::Charge,
            occurred_at: Utc::now(),
        }
    }

    pub fn use_points(user_id: UserId, amount: u64) -> Self {
        Self {
            user_id,
            amount,
            kind: TransactionKind::Use,
            occurred_at: Utc::now(),
        }
    }
}

impl<H, B> Service<SubmitTransactionRequest> for DomainLogic<H, B>
where
    H: HistoryPort + 'static,
    B: BalancePort + 'static,
{
    type Response = TransactionRecord;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SubmitTransactionRequest) -> Self::Future {
        let history = self.history.clone();
        let balance = self.balance.clone();
        let locks = self.locks.clone();
        let max_balance = self.max_balance;
        Box::pin(async move {
            let lock = locks.acquire_lock_for(req.user_id);
            let _guard = lock.lock().await;

            submit_locked(history.as_ref(), balance.as_ref(), max_balance, req).await
        })
    }
}

/// Validate the request against the cached snapshot and append it to the history
///
/// The caller must hold the user's lock.
pub(super) async fn submit_locked<H, B>(
    history: &H,
    balance: &B,
    max_balance: u64,
    req: SubmitTransactionRequest,
) -> Result<TransactionRecord, Error>
where
    H: HistoryPort + ?Sized,
    B: BalancePort + ?Sized,
{
    validate_locked(balance, max_balance, &req).await?;
    append_locked(history, req).await
}

/// Check the request against the cached snapshot and return that snapshot
///
/// The caller must hold the user's lock.
pub(super) async fn validate_locked<B>(
    balance: &B,
    max_balance: u64,
    req: &SubmitTransactionRequest,
) -> Result<PointBalance, Error>
where
    B: BalancePort + ?Sized,
{
    if req.amount == 0 {
        tracing::debug!(user_id = req.user_id, "rejected transaction with zero amount");
        return Err(Error::InvalidArgument("amount must be positive".into()));
    }

    // Checked against the last reconciled value, not a fold of the history
    let snapshot = balance.select_by_id(req.user_id).await?;
    if let Err(err) = check_transaction(snapshot.point, req.kind, req.amount, max_balance) {
        tracing::debug!(
            user_id = req.user_id,
            kind = ?req.kind,
            amount = req.amount,
            point = snapshot.point,
            error = %err,
            "rejected transaction"
        );
        return Err(err);
    }

    Ok(snapshot)
}

pub(super) async fn append_locked<H>(
    history: &H,
    req: SubmitTransactionRequest,
) -> Result<TransactionRecord, Error>
where
    H: HistoryPort + ?Sized,
{
    let record = history
        .insert(req.user_id, req.amount, req.kind, req.occurred_at)
        .await?;
    tracing::debug!(
        user_id = record.user_id,
        record_id = record.id,
        kind = ?record.kind,
        amount = record.amount,
        "appended transaction"
    );

    Ok(record)
}

/// Business rules for a new transaction on top of the `current` balance
fn check_transaction(
    current: u64,
    kind: TransactionKind,
    amount: u64,
    max_balance: u64,
) -> Result<(), Error> {
    match kind {
        TransactionKind::Use if amount > current => Err(Error::InsufficientBalance {
            available: current,
            requested: amount,
        }),
        TransactionKind::Charge
            if current
                .checked_add(amount)
                .map_or(true, |total| total > max_balance) =>
        {
            Err(Error::BalanceCapExceeded {
                current,
                requested: amount,
                max: max_balance,
            })
        }
        _ => Ok(()),
    }
}
