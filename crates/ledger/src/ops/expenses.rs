use chrono::{DateTime, Utc};

use crate::{
    Expense, GroupId, LedgerError, Money, RemovedExpense, ResultLedger, StoreKind, UserId,
};

use super::{EmptySplitPolicy, Ledger, groups::require_group};

impl Ledger {
    /// Records an expense paid by `payer_id` and split among `split_with`.
    ///
    /// The payer is credited `amount`; each participant is debited its share
    /// (the payer too, when listed). The new expense gets id `count + 1`.
    ///
    /// Participants don't have to be group members: missing balance entries
    /// are created on the fly.
    pub async fn add_expense(
        &self,
        group_id: &GroupId,
        payer_id: UserId,
        amount: Money,
        description: &str,
        split_with: &[UserId],
        occurred_at: DateTime<Utc>,
    ) -> ResultLedger<Expense> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "amount must be greater than 0, got {amount}"
            )));
        }

        let expense = self
            .with_group(group_id, &[StoreKind::Expenses, StoreKind::Balances], |current| {
                let record = require_group(current, group_id)?;
                if split_with.is_empty() {
                    match self.empty_split {
                        EmptySplitPolicy::Reject => {
                            return Err(LedgerError::NoSplitParticipants(format!(
                                "expense '{description}' has nobody to split with"
                            )));
                        }
                        EmptySplitPolicy::Allow => {
                            tracing::warn!(
                                group = %group_id,
                                %description,
                                "expense without participants, balances no longer sum to zero"
                            );
                        }
                    }
                }

                let mut next = record.clone();
                let expense = Expense::new(
                    next.expenses.len() as u32 + 1,
                    payer_id,
                    amount,
                    description.to_string(),
                    split_with.to_vec(),
                    occurred_at,
                );
                expense.apply(&mut next.balances)?;
                next.expenses.push(expense.clone());
                Ok((Some(next), expense))
            })
            .await?;

        tracing::info!(
            group = %group_id,
            id = expense.id,
            payer = %payer_id,
            %amount,
            per_person = %expense.per_person,
            "expense added"
        );
        Ok(expense)
    }

    /// Removes the first expense whose description matches (ignoring case)
    /// and reverts its effect on balances.
    ///
    /// Later expenses are renumbered so ids stay `1..N`: an id read before
    /// the removal may point to a different expense afterwards.
    pub async fn remove_expense(
        &self,
        group_id: &GroupId,
        description: &str,
    ) -> ResultLedger<RemovedExpense> {
        let removed = self
            .with_group(group_id, &[StoreKind::Expenses, StoreKind::Balances], |current| {
                let record = require_group(current, group_id)?;
                let index = record
                    .expenses
                    .iter()
                    .position(|e| e.matches_description(description))
                    .ok_or_else(|| LedgerError::ExpenseNotFound(description.to_string()))?;

                let mut next = record.clone();
                let expense = next.expenses.remove(index);
                expense.revert(&mut next.balances)?;
                for (idx, remaining) in next.expenses.iter_mut().enumerate() {
                    remaining.id = idx as u32 + 1;
                }

                let removed = RemovedExpense {
                    expense,
                    remaining: next.expenses.len(),
                };
                Ok((Some(next), removed))
            })
            .await?;

        tracing::info!(
            group = %group_id,
            description = %removed.expense.description,
            amount = %removed.expense.amount,
            "expense removed"
        );
        Ok(removed)
    }

    /// Expenses in insertion order; with `window`, only the last `window`.
    pub async fn expenses(&self, group_id: &GroupId, window: Option<usize>) -> Vec<Expense> {
        tracing::debug!(group = %group_id, ?window, "listing expenses");
        self.read_group(group_id, |record| {
            let skip = window.map_or(0, |last| record.expenses.len().saturating_sub(last));
            record.expenses[skip..].to_vec()
        })
        .await
        .unwrap_or_default()
    }
}
