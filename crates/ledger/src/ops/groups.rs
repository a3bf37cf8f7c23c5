use crate::{
    GroupId, GroupRecord, GroupReset, GroupSummary, LedgerError, ResultLedger, StoreKind, UserId,
};

use super::Ledger;

impl Ledger {
    /// Initializes a group with its members.
    ///
    /// Every member starts with a zero balance and the group with no
    /// expenses. Duplicate ids are ignored (first occurrence wins).
    pub async fn initialize(
        &self,
        group_id: &GroupId,
        members: &[UserId],
    ) -> ResultLedger<GroupSummary> {
        let mut unique: Vec<UserId> = Vec::with_capacity(members.len());
        for member in members {
            if !unique.contains(member) {
                unique.push(*member);
            }
        }
        if unique.is_empty() {
            return Err(LedgerError::NoMembers(format!(
                "group {group_id} needs at least one member"
            )));
        }

        let summary = self
            .with_group(group_id, &StoreKind::ALL, |current| {
                if let Some(record) = current {
                    return Err(LedgerError::AlreadyInitialized(format!(
                        "group {group_id} already has {} members, reset it first",
                        record.members.len()
                    )));
                }
                let summary = GroupSummary {
                    group_id: group_id.clone(),
                    members: unique.clone(),
                };
                Ok((Some(GroupRecord::new(unique)), summary))
            })
            .await?;

        tracing::info!(group = %group_id, members = summary.members.len(), "group initialized");
        Ok(summary)
    }

    /// Deletes membership, balances and expenses of a group. Irreversible.
    pub async fn reset(&self, group_id: &GroupId) -> ResultLedger<GroupReset> {
        let reset = self
            .with_group(group_id, &StoreKind::ALL, |current| {
                let record = require_group(current, group_id)?;
                let reset = GroupReset {
                    group_id: group_id.clone(),
                    removed_expenses: record.expenses.len(),
                };
                Ok((None, reset))
            })
            .await?;

        tracing::info!(group = %group_id, removed_expenses = reset.removed_expenses, "group reset");
        Ok(reset)
    }

    pub async fn is_initialized(&self, group_id: &GroupId) -> bool {
        self.read_group(group_id, |record| !record.members.is_empty())
            .await
            .unwrap_or(false)
    }

    /// Members of the group in initialization order, empty if unknown.
    pub async fn members(&self, group_id: &GroupId) -> Vec<UserId> {
        self.read_group(group_id, |record| record.members.clone())
            .await
            .unwrap_or_default()
    }
}

pub(super) fn not_initialized(group_id: &GroupId) -> LedgerError {
    LedgerError::NotInitialized(format!("group {group_id} has no members, initialize it first"))
}

/// Current record of an initialized group, or `NotInitialized`.
pub(super) fn require_group<'a>(
    current: Option<&'a GroupRecord>,
    group_id: &GroupId,
) -> ResultLedger<&'a GroupRecord> {
    current.ok_or_else(|| not_initialized(group_id))
}
