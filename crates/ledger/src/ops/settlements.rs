use crate::{GroupId, LedgerError, Money, ResultLedger, Settlement, StoreKind, UserId};

use super::{Ledger, groups::require_group};

impl Ledger {
    /// Moves `amount` from a debtor (`from_id`, negative balance) to a
    /// creditor (`to_id`, positive balance).
    ///
    /// The amount is capped by `min(|from|, to)` so a settlement never flips
    /// the sign of either balance. Settling a user with itself is not
    /// rejected here; callers are expected to refuse it.
    pub async fn settle_debt(
        &self,
        group_id: &GroupId,
        from_id: UserId,
        to_id: UserId,
        amount: Money,
    ) -> ResultLedger<Settlement> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "amount must be greater than 0, got {amount}"
            )));
        }

        let settlement = self
            .with_group(group_id, &[StoreKind::Balances], |current| {
                let record = require_group(current, group_id)?;
                let balance_of = |user: UserId| {
                    record.balances.get(&user).copied().ok_or_else(|| {
                        LedgerError::UnknownUser(format!("user {user} has no balance in group {group_id}"))
                    })
                };
                let from_balance = balance_of(from_id)?;
                let to_balance = balance_of(to_id)?;

                if !from_balance.is_negative() {
                    return Err(LedgerError::NotOwing(format!(
                        "user {from_id} doesn't owe any money (balance: {from_balance})"
                    )));
                }
                if !to_balance.is_positive() {
                    return Err(LedgerError::NotOwed(format!(
                        "user {to_id} isn't owed any money (balance: {to_balance})"
                    )));
                }

                let max_settlement = from_balance.abs().min(to_balance);
                if amount > max_settlement {
                    return Err(LedgerError::ExcessiveAmount(format!(
                        "maximum settlement possible: {max_settlement}"
                    )));
                }

                let overflow = || LedgerError::InvalidAmount(format!("amount too large: {amount}"));
                let after = (
                    from_balance.checked_add(amount).ok_or_else(overflow)?,
                    to_balance.checked_sub(amount).ok_or_else(overflow)?,
                );
                let mut next = record.clone();
                next.balances.insert(from_id, after.0);
                next.balances.insert(to_id, after.1);
                let settlement = Settlement {
                    from: from_id,
                    to: to_id,
                    amount,
                    before: (from_balance, to_balance),
                    after,
                };
                Ok((Some(next), settlement))
            })
            .await?;

        tracing::info!(
            group = %group_id,
            from = %from_id,
            to = %to_id,
            %amount,
            "debt settled"
        );
        Ok(settlement)
    }
}
