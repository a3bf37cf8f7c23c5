//! The module contains the per-group accounting state.
use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{Expense, GroupId, Money, UserId};

/// Signed balance per user of one group.
pub type Balances = BTreeMap<UserId, Money>;

/// Everything the ledger knows about one initialized group.
///
/// Members, balances and expenses live and die together: a record exists
/// from `initialize` until `reset`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub members: Vec<UserId>,
    pub balances: Balances,
    pub expenses: Vec<Expense>,
}

impl GroupRecord {
    /// A fresh record with a zero balance for each member.
    pub(crate) fn new(members: Vec<UserId>) -> Self {
        let balances = members.iter().map(|m| (*m, Money::ZERO)).collect();
        Self {
            members,
            balances,
            expenses: Vec::new(),
        }
    }

    /// Sum of all balances. Zero whenever every expense has participants.
    #[must_use]
    pub fn total(&self) -> Money {
        self.balances.values().copied().sum()
    }
}

/// Result of a successful `initialize`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSummary {
    pub group_id: GroupId,
    pub members: Vec<UserId>,
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group initialized with {} members", self.members.len())
    }
}

/// Result of a successful `reset`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupReset {
    pub group_id: GroupId,
    pub removed_expenses: usize,
}

impl fmt::Display for GroupReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Group reset successfully")
    }
}
