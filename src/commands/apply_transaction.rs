use std::task::{Context, Poll};

use crate::{
    domain::{fold_history, TransactionRecord, UserId},
    ports::{balance::BalancePort, history::HistoryPort},
};
use tower::Service;

use super::{
    reconcile::reconcile_locked,
    submit_transaction::{append_locked, validate_locked, SubmitTransactionRequest},
    DomainLogic, Error, ServiceFuture,
};

/// Charge or use points and reconcile in one step
///
/// Submission and reconciliation run under a single acquisition of the user's lock, so a caller
/// that only goes through this request never validates against a stale snapshot. The record is
/// only appended once the resulting history is known to fold to a non-negative balance.
#[derive(Clone, Debug)]
pub struct ApplyTransactionRequest {
    pub transaction: SubmitTransactionRequest,
}

impl ApplyTransactionRequest {
    pub fn charge(user_id: UserId, amount: u64) -> Self {
        SubmitTransactionRequest::charge(user_id, amount).into()
    }

    pub fn use_points(user_id: UserId, amount: u64) -> Self {
        SubmitTransactionRequest::use_points(user_id, amount).into()
    }
}

impl From<SubmitTransactionRequest> for ApplyTransactionRequest {
    fn from(transaction: SubmitTransactionRequest) -> Self {
        Self { transaction }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ApplyTransactionResponse {
    pub record: TransactionRecord,
    /// Balance before the transaction
    pub old_point: u64,
    /// Balance after reconciliation
    pub new_point: u64,
}

impl<H, B> Service<ApplyTransactionRequest> for DomainLogic<H, B>
where
    H: HistoryPort + 'static,
    B: BalancePort + 'static,
{
    type Response = ApplyTransactionResponse;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ApplyTransactionRequest) -> Self::Future {
        let history = self.history.clone();
        let balance = self.balance.clone();
        let locks = self.locks.clone();
        let max_balance = self.max_balance;
        Box::pin(async move {
            let user_id = req.transaction.user_id;
            let lock = locks.acquire_lock_for(user_id);
            let _guard = lock.lock().await;

            let old_point = validate_locked(balance.as_ref(), max_balance, &req.transaction)
                .await?
                .point;

            // Fold before appending so a failure leaves the history as it was
            let records = history.select_all(user_id).await?;
            let total = fold_history(&records)
                + req.transaction.kind.signed(req.transaction.amount);
            if total < 0 {
                tracing::warn!(
                    user_id,
                    total = %total,
                    records = records.len(),
                    "history would fold to a negative balance"
                );
                return Err(Error::NegativeBalance { user_id, total });
            }

            let record = append_locked(history.as_ref(), req.transaction).await?;
            let snapshot =
                reconcile_locked(history.as_ref(), balance.as_ref(), max_balance, user_id).await?;

            Ok(ApplyTransactionResponse {
                record,
                old_point,
                new_point: snapshot.point,
            })
        })
    }
}
