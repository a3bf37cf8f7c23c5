use std::fmt;

use crate::{Money, UserId};

/// A validated transfer from a debtor to a creditor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub from: UserId,
    pub to: UserId,
    pub amount: Money,
    /// Balances of `from` and `to` before the transfer.
    pub before: (Money, Money),
    /// Balances of `from` and `to` after the transfer.
    pub after: (Money, Money),
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Settled {} from {} to {}", self.amount, self.from, self.to)
    }
}

/// Pairwise "who owes whom" line derived from balances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debt {
    pub debtor: UserId,
    pub creditor: UserId,
    pub amount: Money,
}

impl fmt::Display for Debt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} owes {} {}", self.debtor, self.creditor, self.amount)
    }
}
