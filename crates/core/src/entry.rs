use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

/// Description used when a statement source omits or blanks the memo field.
pub const DESCRIPTION_PLACEHOLDER: &str = "(sem descrição)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    /// Sign convention for balance effects: income adds, expense subtracts.
    pub fn signed_cents(self, amount: Money) -> i64 {
        match self {
            Direction::Income => amount.to_cents(),
            Direction::Expense => -amount.to_cents(),
        }
    }

    pub fn from_signed_amount(cents: i64) -> Option<Self> {
        match cents {
            c if c > 0 => Some(Direction::Income),
            c if c < 0 => Some(Direction::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Income => write!(f, "income"),
            Direction::Expense => write!(f, "expense"),
        }
    }
}

/// Normalized statement record every decoder produces. `amount` is always a
/// positive magnitude; the balance effect is carried by `direction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub direction: Direction,
    pub document_ref: Option<String>,
}

impl StatementEntry {
    /// Builds an entry from a signed cents amount. An explicit direction
    /// marker from the source wins; otherwise the sign decides. Returns
    /// `None` for zero amounts, which carry no direction at all.
    pub fn from_signed(
        date: NaiveDate,
        description: Option<String>,
        signed_cents: i64,
        explicit: Option<Direction>,
        document_ref: Option<String>,
    ) -> Option<Self> {
        if signed_cents == 0 {
            return None;
        }
        let direction = explicit.or_else(|| Direction::from_signed_amount(signed_cents))?;
        let description = match description {
            Some(d) if !d.trim().is_empty() => d.trim().to_string(),
            _ => DESCRIPTION_PLACEHOLDER.to_string(),
        };
        let document_ref = document_ref.filter(|d| !d.trim().is_empty());
        Some(StatementEntry {
            date,
            description,
            amount: Money::from_cents(signed_cents.abs()),
            direction,
            document_ref,
        })
    }
}
