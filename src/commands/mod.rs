use std::{borrow::Cow, future::Future, pin::Pin, sync::Arc};

use crate::{
    config::Config,
    domain::{UserId, MAX_BALANCE},
    locks::LockRegistry,
};

pub mod apply_transaction;
pub mod get_balance;
pub mod list_history;
pub mod reconcile;
pub mod submit_transaction;

type ServiceFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

/// Entry point for every balance operation
///
/// Each operation is exposed as a [`tower::Service`] over its own request type. Clones share the
/// same ports and the same lock registry, so a clone can be handed to every concurrent caller.
pub struct DomainLogic<H, B> {
    history: Arc<H>,
    balance: Arc<B>,
    locks: Arc<LockRegistry>,
    max_balance: u64,
}

impl<H, B> DomainLogic<H, B> {
    pub fn new(history: Arc<H>, balance: Arc<B>, locks: Arc<LockRegistry>) -> Self {
        Self {
            history,
            balance,
            locks,
            max_balance: MAX_BALANCE,
        }
    }

    pub fn from_config(history: Arc<H>, balance: Arc<B>, config: &Config) -> Self {
        Self::new(
            history,
            balance,
            Arc::new(LockRegistry::with_capacity(config.lock_capacity)),
        )
        .with_max_balance(config.max_balance)
    }

    pub fn with_max_balance(mut self, max_balance: u64) -> Self {
        self.max_balance = max_balance;
        self
    }

    pub fn locks(&self) -> &Arc<LockRegistry> {
        &self.locks
    }
}

impl<H, B> Clone for DomainLogic<H, B> {
    fn clone(&self) -> Self {
        Self {
            history: self.history.clone(),
            balance: self.balance.clone(),
            locks: self.locks.clone(),
            max_balance: self.max_balance,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),

    /// A use would drive the cached balance below zero
    #[error("insufficient balance: {requested} requested, {available} available")]
    InsufficientBalance { available: u64, requested: u64 },

    /// A charge would push the cached balance above the maximum
    #[error("balance cap exceeded: {current} + {requested} is above {max}")]
    BalanceCapExceeded {
        current: u64,
        requested: u64,
        max: u64,
    },

    #[error("user {0} has no transaction history")]
    NoHistory(UserId),

    /// The history folds to a negative total
    ///
    /// This means a use was accepted against a stale snapshot. The snapshot is left untouched.
    #[error("history of user {user_id} folds to a negative balance: {total}")]
    NegativeBalance { user_id: UserId, total: i128 },

    #[error("history port error: {0:?}")]
    History(#[from] crate::ports::history::Error),
    #[error("balance port error: {0:?}")]
    Balance(#[from] crate::ports::balance::Error),
}
