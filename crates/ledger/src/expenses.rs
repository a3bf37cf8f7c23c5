//! The module contains the representation of a shared expense.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Balances, LedgerError, Money, ResultLedger, UserId};

/// One recorded payment split across participants at creation time.
///
/// `per_person` and `remainder` are frozen when the expense is created: the
/// first `remainder` participants (in `split_with` order) carry one extra cent
/// so the debits always add up to `amount`. Reversal replays these frozen
/// values and never re-divides `amount`.
///
/// An empty `split_with` yields `per_person == 0`: the payer is credited but
/// nobody is debited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: u32,
    pub payer_id: UserId,
    pub amount: Money,
    pub description: String,
    pub split_with: Vec<UserId>,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub per_person: Money,
    #[serde(default)]
    pub remainder: u32,
}

impl Expense {
    pub(crate) fn new(
        id: u32,
        payer_id: UserId,
        amount: Money,
        description: String,
        split_with: Vec<UserId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let (per_person, remainder) = amount.split(split_with.len());
        Self {
            id,
            payer_id,
            amount,
            description,
            split_with,
            timestamp,
            per_person,
            remainder,
        }
    }

    /// The frozen debit of every participant, in `split_with` order.
    pub fn shares(&self) -> impl Iterator<Item = (UserId, Money)> + '_ {
        self.split_with.iter().enumerate().map(|(idx, user)| {
            let extra = if (idx as u64) < u64::from(self.remainder) {
                Money::new(1)
            } else {
                Money::ZERO
            };
            (*user, self.per_person + extra)
        })
    }

    /// Credits the payer and debits every participant, creating missing
    /// balance entries on the way.
    ///
    /// Fails with `InvalidAmount` when a balance would leave the `i64` cent
    /// range; `balances` may then be partially updated and must be dropped.
    pub(crate) fn apply(&self, balances: &mut Balances) -> ResultLedger<()> {
        let payer = balances.entry(self.payer_id).or_default();
        *payer = payer.checked_add(self.amount).ok_or_else(|| overflow(self.payer_id))?;
        for (user, share) in self.shares() {
            let balance = balances.entry(user).or_default();
            *balance = balance.checked_sub(share).ok_or_else(|| overflow(user))?;
        }
        Ok(())
    }

    /// Undoes [`Expense::apply`]. Users whose balance entry disappeared are
    /// skipped.
    pub(crate) fn revert(&self, balances: &mut Balances) -> ResultLedger<()> {
        if let Some(balance) = balances.get_mut(&self.payer_id) {
            *balance = balance
                .checked_sub(self.amount)
                .ok_or_else(|| overflow(self.payer_id))?;
        }
        for (user, share) in self.shares() {
            if let Some(balance) = balances.get_mut(&user) {
                *balance = balance.checked_add(share).ok_or_else(|| overflow(user))?;
            }
        }
        Ok(())
    }

    /// Files written before `remainder` existed only carry the rounded
    /// share; recover the leftover cents from it so the debits add up to
    /// `amount` again.
    pub(crate) fn restore_remainder(&mut self) {
        if self.remainder != 0 || self.split_with.is_empty() {
            return;
        }
        let parts = self.split_with.len() as i64;
        let leftover = self
            .per_person
            .cents()
            .checked_mul(parts)
            .and_then(|debited| self.amount.cents().checked_sub(debited))
            .filter(|leftover| (0..parts).contains(leftover))
            .and_then(|leftover| u32::try_from(leftover).ok());
        if let Some(leftover) = leftover {
            self.remainder = leftover;
        }
    }

    pub(crate) fn matches_description(&self, description: &str) -> bool {
        self.description.to_lowercase() == description.to_lowercase()
    }
}

fn overflow(user: UserId) -> LedgerError {
    LedgerError::InvalidAmount(format!("amount too large: balance of user {user} would overflow"))
}

/// Result of a successful `remove_expense`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovedExpense {
    pub expense: Expense,
    /// Expenses left in the group, already renumbered.
    pub remaining: usize,
}

impl fmt::Display for RemovedExpense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Removed expense: {} ({})",
            self.expense.description, self.expense.amount
        )
    }
}

/// ISO-8601 timestamps. Older files carry naive local timestamps without an
/// offset; those are read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(super) fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(value) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(value.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn users(ids: &[u64]) -> Vec<UserId> {
        ids.iter().copied().map(UserId::new).collect()
    }

    #[test]
    fn uneven_split_debits_exactly_the_amount() {
        let expense = Expense::new(
            1,
            UserId::new(1),
            Money::new(100_00),
            "taxi".to_string(),
            users(&[1, 2, 3]),
            Utc::now(),
        );
        let shares: Vec<_> = expense.shares().map(|(_, m)| m.cents()).collect();
        assert_eq!(shares, vec![33_34, 33_33, 33_33]);

        let mut balances = Balances::new();
        expense.apply(&mut balances).unwrap();
        assert_eq!(balances.values().copied().sum::<Money>(), Money::ZERO);

        expense.revert(&mut balances).unwrap();
        assert!(balances.values().all(|b| b.is_zero()));
    }

    #[test]
    fn apply_refuses_to_overflow_a_balance() {
        let expense = Expense::new(
            1,
            UserId::new(1),
            Money::new(1),
            "gum".to_string(),
            users(&[2]),
            Utc::now(),
        );
        let mut balances = Balances::new();
        balances.insert(UserId::new(1), Money::new(i64::MAX));

        let err = expense.apply(&mut balances).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidAmount);
    }

    #[test]
    fn legacy_expense_recovers_leftover_cents() {
        let json = r#"{
            "id": 1,
            "payer_id": "10",
            "amount": 100.0,
            "description": "taxi",
            "split_with": ["10", "20", "30"],
            "timestamp": "2024-05-01T19:30:00",
            "per_person": 33.333333333333336
        }"#;
        let mut expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.remainder, 0);

        expense.restore_remainder();
        assert_eq!(expense.remainder, 1);
        let debited: Money = expense.shares().map(|(_, share)| share).sum();
        assert_eq!(debited, expense.amount);
    }

    #[test]
    fn reads_naive_timestamps_as_utc() {
        let json = r#"{
            "id": 1,
            "payer_id": "10",
            "amount": 90.0,
            "description": "dinner",
            "split_with": ["10", "20", "30"],
            "timestamp": "2024-05-01T19:30:00.123456",
            "per_person": 30.0
        }"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.amount, Money::new(90_00));
        assert_eq!(expense.per_person, Money::new(30_00));
        assert_eq!(expense.remainder, 0);
        assert_eq!(
            expense.timestamp.date_naive(),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap().date_naive()
        );
    }

    #[test]
    fn description_match_ignores_case_only() {
        let expense = Expense::new(
            1,
            UserId::new(1),
            Money::new(1_00),
            "Dinner".to_string(),
            users(&[1]),
            Utc::now(),
        );
        assert!(expense.matches_description("dINNER"));
        assert!(!expense.matches_description("dinner "));
        assert!(!expense.matches_description("din"));
    }
}
