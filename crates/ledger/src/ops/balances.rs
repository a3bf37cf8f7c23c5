use crate::{Balances, Debt, GroupId};

use super::Ledger;

impl Ledger {
    /// Balances of every user the group has seen, empty if unknown.
    pub async fn balances(&self, group_id: &GroupId) -> Balances {
        tracing::debug!(group = %group_id, "reading balances");
        self.read_group(group_id, |record| record.balances.clone())
            .await
            .unwrap_or_default()
    }

    /// Pairwise debts between users, in balance order.
    ///
    /// For every pair where one side owes and the other is owed, the debt
    /// is the smaller of the two magnitudes. Lines overlap when a debtor
    /// faces several creditors: this is a view of who could settle with
    /// whom, not a payment plan.
    pub async fn net_debts(&self, group_id: &GroupId) -> Vec<Debt> {
        let balances = self.balances(group_id).await;
        let entries: Vec<_> = balances.into_iter().collect();

        let mut debts = Vec::new();
        for (i, (first, first_balance)) in entries.iter().enumerate() {
            for (second, second_balance) in &entries[i + 1..] {
                if first_balance.is_negative() && second_balance.is_positive() {
                    debts.push(Debt {
                        debtor: *first,
                        creditor: *second,
                        amount: first_balance.abs().min(*second_balance),
                    });
                } else if second_balance.is_negative() && first_balance.is_positive() {
                    debts.push(Debt {
                        debtor: *second,
                        creditor: *first,
                        amount: second_balance.abs().min(*first_balance),
                    });
                }
            }
        }
        debts
    }
}
