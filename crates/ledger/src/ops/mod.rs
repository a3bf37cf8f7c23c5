use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use serde::Deserialize;

use crate::{GroupId, GroupRecord, MemoryStore, ResultLedger, Snapshot, Store, StoreKind};

mod balances;
mod expenses;
mod groups;
mod settlements;

type GroupSlot = Arc<tokio::sync::Mutex<Option<GroupRecord>>>;

/// What `add_expense` does with an empty participant list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySplitPolicy {
    /// Record the expense with a zero share: the payer is credited and
    /// nobody is debited, so the group no longer sums to zero.
    #[default]
    Allow,
    /// Fail with `NoSplitParticipants`.
    Reject,
}

/// The ledger of every group.
///
/// Each group sits behind its own async mutex: mutations of the same group
/// run one at a time over the whole read, persist, commit sequence, while
/// different groups never wait on each other.
#[derive(Debug)]
pub struct Ledger {
    groups: Mutex<HashMap<GroupId, GroupSlot>>,
    store: Arc<dyn Store>,
    empty_split: EmptySplitPolicy,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// Slot of `group_id`, created empty on first use.
    fn slot(&self, group_id: &GroupId) -> GroupSlot {
        let mut groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        groups.entry(group_id.clone()).or_default().clone()
    }

    /// Slot of `group_id` if the ledger has ever seen it. Reads go through
    /// here so unknown ids don't allocate slots.
    fn existing_slot(&self, group_id: &GroupId) -> Option<GroupSlot> {
        let groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        groups.get(group_id).cloned()
    }

    /// Read-only access to the current record of a group.
    async fn read_group<T>(&self, group_id: &GroupId, f: impl FnOnce(&GroupRecord) -> T) -> Option<T> {
        let slot = self.existing_slot(group_id)?;
        let guard = slot.lock().await;
        guard.as_ref().map(f)
    }

    /// Runs a mutation of one group under its lock.
    ///
    /// `f` gets the current record and returns the next one. The next record
    /// is saved to `stores` first and only then replaces the in-memory one,
    /// so a failed save leaves the ledger untouched.
    async fn with_group<T>(
        &self,
        group_id: &GroupId,
        stores: &[StoreKind],
        f: impl FnOnce(Option<&GroupRecord>) -> ResultLedger<(Option<GroupRecord>, T)>,
    ) -> ResultLedger<T> {
        let slot = self.slot(group_id);
        let mut guard = slot.lock().await;
        let (next, value) = f(guard.as_ref())?;
        if let Err(err) = self.store.save(group_id, next.as_ref(), stores) {
            tracing::error!(group = %group_id, "failed to persist group: {err}");
            return Err(err.into());
        }
        *guard = next;
        Ok(value)
    }

    /// Writes the whole in-memory state through the store.
    pub async fn flush(&self) -> ResultLedger<()> {
        let slots: Vec<(GroupId, GroupSlot)> = {
            let groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
            groups
                .iter()
                .map(|(id, slot)| (id.clone(), slot.clone()))
                .collect()
        };

        let mut records = Vec::with_capacity(slots.len());
        for (group_id, slot) in slots {
            if let Some(record) = slot.lock().await.clone() {
                records.push((group_id, record));
            }
        }

        let snapshot = Snapshot::from_records(records.iter().map(|(id, r)| (id, r)));
        self.store.save_all(&snapshot)?;
        tracing::info!(groups = records.len(), "flushed ledger");
        Ok(())
    }
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    store: Option<Arc<dyn Store>>,
    empty_split: EmptySplitPolicy,
}

impl LedgerBuilder {
    /// Pass the store the ledger loads from and writes through.
    pub fn store(mut self, store: Arc<dyn Store>) -> LedgerBuilder {
        self.store = Some(store);
        self
    }

    pub fn empty_split(mut self, policy: EmptySplitPolicy) -> LedgerBuilder {
        self.empty_split = policy;
        self
    }

    /// Construct `Ledger` from what the store currently holds. Defaults to
    /// an empty [`MemoryStore`].
    pub fn build(self) -> Ledger {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn Store>);
        let records = store.load().into_records();
        tracing::info!(groups = records.len(), "loaded ledger");

        let groups = records
            .into_iter()
            .map(|(id, record)| (id, Arc::new(tokio::sync::Mutex::new(Some(record)))))
            .collect();

        Ledger {
            groups: Mutex::new(groups),
            store,
            empty_split: self.empty_split,
        }
    }
}
