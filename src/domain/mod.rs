use chrono::{DateTime, Utc};

/// Identifier of a point holder
pub type UserId = u64;

/// Identifier assigned by the history store on insert
pub type RecordId = u64;

/// Default upper bound for a user's balance
pub const MAX_BALANCE: u64 = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    /// Increases the balance
    Charge,
    /// Decreases the balance
    Use,
}

impl TransactionKind {
    /// Contribution of `amount` points of this kind to a running total
    pub fn signed(self, amount: u64) -> i128 {
        match self {
            TransactionKind::Charge => amount as i128,
            TransactionKind::Use => -(amount as i128),
        }
    }
}

/// One entry of a user's point history
///
/// Records are immutable once appended. The sequence of records for a user, in insertion order,
/// is the authoritative audit trail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: RecordId,
    pub user_id: UserId,
    /// Always positive
    pub amount: u64,
    pub kind: TransactionKind,
    pub occurred_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Contribution of this record to the running total
    pub fn signed_amount(&self) -> i128 {
        self.kind.signed(self.amount)
    }
}

/// Cached balance of a user
///
/// This is the last reconciled total and may lag behind the history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointBalance {
    pub user_id: UserId,
    pub point: u64,
    pub updated_at: DateTime<Utc>,
}

impl PointBalance {
    /// Zero balance for a user that was never reconciled
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            point: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Sum of charges minus sum of uses
pub fn fold_history<'a>(records: impl IntoIterator<Item = &'a TransactionRecord>) -> i128 {
    records
        .into_iter()
        .map(TransactionRecord::signed_amount)
        .sum()
}
