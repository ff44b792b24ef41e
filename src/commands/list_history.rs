use std::task::{Context, Poll};

use crate::{
    domain::{TransactionRecord, UserId},
    ports::{balance::BalancePort, history::HistoryPort},
};
use tower::Service;

use super::{DomainLogic, Error, ServiceFuture};

/// All transactions of a user, in insertion order
///
/// This does not take the user's lock and may race with a concurrent submission.
#[derive(Clone, Debug)]
pub struct ListHistoryRequest {
    pub user_id: UserId,
}

impl<H, B> Service<ListHistoryRequest> for DomainLogic<H, B>
where
    H: HistoryPort + 'static,
    B: BalancePort + 'static,
{
    type Response = Vec<TransactionRecord>;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListHistoryRequest) -> Self::Future {
        let history = self.history.clone();
        Box::pin(async move {
            let records = history.select_all(req.user_id).await?;
            tracing::debug!(user_id = req.user_id, records = records.len(), "listed history");

            Ok(records)
        })
    }
}
