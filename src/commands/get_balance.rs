use std::task::{Context, Poll};

use crate::{
    domain::{PointBalance, UserId},
    ports::{balance::BalancePort, history::HistoryPort},
};
use tower::Service;

use super::{DomainLogic, Error, ServiceFuture};

/// Cached balance of a user, zero if never reconciled
///
/// This does not take the user's lock. The value may lag behind the history until the next
/// reconciliation.
#[derive(Clone, Debug)]
pub struct GetBalanceRequest {
    pub user_id: UserId,
}

impl<H, B> Service<GetBalanceRequest> for DomainLogic<H, B>
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

    fn call(&mut self, req: GetBalanceRequest) -> Self::Future {
        let balance = self.balance.clone();
        Box::pin(async move {
            let snapshot = balance.select_by_id(req.user_id).await?;
            tracing::debug!(user_id = req.user_id, point = snapshot.point, "read balance");

            Ok(snapshot)
        })
    }
}
