//! Shared-expense ledger.
//!
//! A [`Ledger`] keeps, for every group, the member list, the recorded
//! [`Expense`]s and the signed [`Balances`] they produce, and validates
//! settlements between members. Every mutation is written through a
//! [`Store`] before it becomes visible.
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use chrono::Utc;
//! use ledger::{GroupId, Ledger, Money, UserId};
//!
//! let ledger = Ledger::builder().build();
//! let group = GroupId::from("guild");
//! let members = [UserId::new(1), UserId::new(2), UserId::new(3)];
//!
//! ledger.initialize(&group, &members).await.unwrap();
//! ledger
//!     .add_expense(&group, members[0], Money::new(90_00), "dinner", &members, Utc::now())
//!     .await
//!     .unwrap();
//!
//! let balances = ledger.balances(&group).await;
//! assert_eq!(balances[&members[0]], Money::new(60_00));
//! assert_eq!(balances[&members[1]], Money::new(-30_00));
//! # });
//! ```

pub use error::{ErrorKind, LedgerError};
pub use expenses::{Expense, RemovedExpense};
pub use groups::{Balances, GroupRecord, GroupReset, GroupSummary};
pub use ids::{GroupId, UserId};
pub use money::Money;
pub use ops::{EmptySplitPolicy, Ledger, LedgerBuilder};
pub use settlements::{Debt, Settlement};
pub use storage::{JsonStore, MemoryStore, Snapshot, Store, StoreError, StoreKind};

mod error;
mod expenses;
mod groups;
mod ids;
mod money;
mod ops;
mod settlements;
mod storage;

type ResultLedger<T> = Result<T, LedgerError>;
