use std::task::{Context, Poll};

use crate::{
    domain::{fold_history, PointBalance, UserId},
    ports::{balance::BalancePort, history::HistoryPort},
};
use tower::Service;

use super::{DomainLogic, Error, ServiceFuture};

/// Recompute the cached balance of a user from their complete history
#[derive(Clone, Debug)]
pub struct ReconcileRequest {
    pub user_id: UserId,
}

impl<H, B> Service<ReconcileRequest> for DomainLogic<H, B>
where
    H: HistoryPort + 'static,
    B: BalancePort + 'static,
{
    type Response = PointBalance;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ReconcileRequest) -> Self::Future {
        let history = self.history.clone();
        let balance = self.balance.clone();
        let locks = self.locks.clone();
        let max_balance = self.max_balance;
        Box::pin(async move {
            let lock = locks.acquire_lock_for(req.user_id);
            let _guard = lock.lock().await;

            reconcile_locked(history.as_ref(), balance.as_ref(), max_balance, req.user_id).await
        })
    }
}

/// Fold the history and overwrite the snapshot with the result
///
/// The caller must hold the user's lock. On failure the previous snapshot is left as is.
pub(super) async fn reconcile_locked<H, B>(
    history: &H,
    balance: &B,
    max_balance: u64,
    user_id: UserId,
) -> Result<PointBalance, Error>
where
    H: HistoryPort + ?Sized,
    B: BalancePort + ?Sized,
{
    let records = history.select_all(user_id).await?;
    if records.is_empty() {
        tracing::debug!(user_id, "nothing to reconcile");
        return Err(Error::NoHistory(user_id));
    }

    let total = fold_history(&records);
    if total < 0 {
        tracing::warn!(
            user_id,
            total = %total,
            records = records.len(),
            "history folds to a negative balance"
        );
        return Err(Error::NegativeBalance { user_id, total });
    }
    // Charges are capped on submit, so this only saturates on a corrupt history.
    let point = u64::try_from(total).unwrap_or(u64::MAX);
    if point > max_balance {
        tracing::warn!(user_id, point, max_balance, "reconciled balance is above the cap");
    }

    let snapshot = balance.insert_or_update(user_id, point).await?;
    tracing::info!(
        user_id,
        point = snapshot.point,
        records = records.len(),
        "reconciled balance"
    );

    Ok(snapshot)
}
