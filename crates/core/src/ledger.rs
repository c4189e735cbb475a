use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::{AccountId, UserId};
use super::entry::Direction;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Paid,
    Received,
}

impl TransactionStatus {
    /// Settled status consistent with the transaction's direction.
    pub fn settled_for(direction: Direction) -> Self {
        match direction {
            Direction::Income => TransactionStatus::Received,
            Direction::Expense => TransactionStatus::Paid,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Paid => write!(f, "paid"),
            TransactionStatus::Received => write!(f, "received"),
        }
    }
}

/// Ledger row as read back from storage. The reconciliation engine only
/// looks at date, amount, direction and description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: i64,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub description: String,
    pub amount: Money,
    pub direction: Direction,
    pub competence_date: NaiveDate,
    pub status: TransactionStatus,
}
