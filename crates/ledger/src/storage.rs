//! Durable storage of the ledger state.
//!
//! The state is three logical stores, each keyed by group id:
//!
//! - expenses: `group -> [Expense]`
//! - balances: `group -> {user -> amount}`
//! - members: `group -> [user]`
//!
//! [`Store`] is the contract the ledger calls after every mutation. It is
//! synchronous: a `save` that returns `Ok` means the data is on disk (or in
//! whatever medium the implementation uses).
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{Balances, Expense, GroupId, GroupRecord, UserId};

/// Storage failures. Surfaced to callers as `LedgerError::Persistence`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
    #[error("storage json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// One of the three logical stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Expenses,
    Balances,
    Members,
}

impl StoreKind {
    pub const ALL: [StoreKind; 3] = [StoreKind::Expenses, StoreKind::Balances, StoreKind::Members];

    /// File name used by [`JsonStore`].
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            StoreKind::Expenses => "expenses.json",
            StoreKind::Balances => "balances.json",
            StoreKind::Members => "group_members.json",
        }
    }
}

/// Full content of the three stores.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub expenses: BTreeMap<GroupId, Vec<Expense>>,
    pub balances: BTreeMap<GroupId, Balances>,
    pub members: BTreeMap<GroupId, Vec<UserId>>,
}

impl Snapshot {
    /// Builds a snapshot out of initialized groups.
    pub fn from_records<'a>(records: impl IntoIterator<Item = (&'a GroupId, &'a GroupRecord)>) -> Self {
        let mut snapshot = Snapshot::default();
        for (group_id, record) in records {
            snapshot.put(group_id, Some(record), &StoreKind::ALL);
        }
        snapshot
    }

    /// Replaces (or removes, with `None`) the group entry in the given stores.
    pub fn put(&mut self, group_id: &GroupId, record: Option<&GroupRecord>, stores: &[StoreKind]) {
        for kind in stores {
            match (kind, record) {
                (StoreKind::Expenses, Some(r)) => {
                    self.expenses.insert(group_id.clone(), r.expenses.clone());
                }
                (StoreKind::Balances, Some(r)) => {
                    self.balances.insert(group_id.clone(), r.balances.clone());
                }
                (StoreKind::Members, Some(r)) => {
                    self.members.insert(group_id.clone(), r.members.clone());
                }
                (StoreKind::Expenses, None) => {
                    self.expenses.remove(group_id);
                }
                (StoreKind::Balances, None) => {
                    self.balances.remove(group_id);
                }
                (StoreKind::Members, None) => {
                    self.members.remove(group_id);
                }
            }
        }
    }

    /// Reassembles per-group records.
    ///
    /// Only groups with at least one member are initialized; balances or
    /// expenses left behind for other groups are dropped with a warning.
    pub fn into_records(mut self) -> BTreeMap<GroupId, GroupRecord> {
        let mut records = BTreeMap::new();
        for (group_id, members) in std::mem::take(&mut self.members) {
            if members.is_empty() {
                continue;
            }
            let mut expenses = self.expenses.remove(&group_id).unwrap_or_default();
            expenses.iter_mut().for_each(Expense::restore_remainder);
            let record = GroupRecord {
                members,
                balances: self.balances.remove(&group_id).unwrap_or_default(),
                expenses,
            };
            records.insert(group_id, record);
        }

        for group_id in self.balances.keys().chain(self.expenses.keys()) {
            tracing::warn!(group = %group_id, "dropping state of group without members");
        }
        records
    }
}

/// Persistence contract of the ledger.
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Loads all stores. Missing or corrupt data yields empty stores.
    fn load(&self) -> Snapshot;

    /// Persists the full content of each store in `stores`, with the entry of
    /// `group_id` replaced by `record` (removed when `None`).
    fn save(
        &self,
        group_id: &GroupId,
        record: Option<&GroupRecord>,
        stores: &[StoreKind],
    ) -> Result<(), StoreError>;

    /// Persists every store in full.
    fn save_all(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// In-memory store, for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: Mutex::new(snapshot),
        }
    }

    /// Copy of what has been saved so far.
    pub fn snapshot(&self) -> Snapshot {
        self.inner
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Snapshot {
        self.snapshot()
    }

    fn save(
        &self,
        group_id: &GroupId,
        record: Option<&GroupRecord>,
        stores: &[StoreKind],
    ) -> Result<(), StoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))?;
        guard.put(group_id, record, stores);
        Ok(())
    }

    fn save_all(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))?;
        *guard = snapshot.clone();
        Ok(())
    }
}

/// JSON files in a data directory, one per logical store.
///
/// Keeps a mirror of what is on disk; every save rewrites the touched files
/// from the mirror plus the change, and the mirror only moves forward once
/// all of them are written.
#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    mirror: Mutex<Snapshot>,
}

impl JsonStore {
    /// Opens the store rooted at `dir`, reading whatever is already there.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let snapshot = Snapshot {
            expenses: read_store(&dir, StoreKind::Expenses),
            balances: read_store(&dir, StoreKind::Balances),
            members: read_store(&dir, StoreKind::Members),
        };
        tracing::info!(
            dir = %dir.display(),
            groups = snapshot.members.len(),
            "opened json store"
        );
        Self {
            dir,
            mirror: Mutex::new(snapshot),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_kinds(&self, next: &Snapshot, prev: &Snapshot, stores: &[StoreKind]) -> Result<(), StoreError> {
        for (idx, kind) in stores.iter().enumerate() {
            if let Err(err) = write_kind(&self.dir, *kind, next) {
                // Put back the files already rewritten for this change.
                for written in &stores[..idx] {
                    if let Err(restore_err) = write_kind(&self.dir, *written, prev) {
                        tracing::warn!(
                            file = written.file_name(),
                            "failed to restore store after partial save: {restore_err}"
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

impl Store for JsonStore {
    fn load(&self) -> Snapshot {
        self.mirror
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn save(
        &self,
        group_id: &GroupId,
        record: Option<&GroupRecord>,
        stores: &[StoreKind],
    ) -> Result<(), StoreError> {
        let mut guard = self
            .mirror
            .lock()
            .map_err(|_| StoreError::Unavailable("json store poisoned".to_string()))?;
        let mut next = guard.clone();
        next.put(group_id, record, stores);
        self.write_kinds(&next, &guard, stores)?;
        *guard = next;
        Ok(())
    }

    fn save_all(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut guard = self
            .mirror
            .lock()
            .map_err(|_| StoreError::Unavailable("json store poisoned".to_string()))?;
        self.write_kinds(snapshot, &guard, &StoreKind::ALL)?;
        *guard = snapshot.clone();
        Ok(())
    }
}

fn read_store<T: DeserializeOwned + Default>(dir: &Path, kind: StoreKind) -> T {
    let path = dir.join(kind.file_name());
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return T::default(),
        Err(err) => {
            tracing::warn!(path = %path.display(), "unreadable store, starting empty: {err}");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(path = %path.display(), "corrupt store, starting empty: {err}");
            T::default()
        }
    }
}

fn write_kind(dir: &Path, kind: StoreKind, snapshot: &Snapshot) -> Result<(), StoreError> {
    let path = dir.join(kind.file_name());
    match kind {
        StoreKind::Expenses => write_json_file(&path, &snapshot.expenses),
        StoreKind::Balances => write_json_file(&path, &snapshot.balances),
        StoreKind::Members => write_json_file(&path, &snapshot.members),
    }
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(value)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::Money;

    fn temp_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../target/test_data")
            .join(Uuid::new_v4().to_string())
    }

    fn record() -> GroupRecord {
        let mut record = GroupRecord::new(vec![UserId::new(1), UserId::new(2)]);
        let expense = Expense::new(
            1,
            UserId::new(1),
            Money::new(10_00),
            "pizza".to_string(),
            record.members.clone(),
            Utc::now(),
        );
        expense.apply(&mut record.balances).unwrap();
        record.expenses.push(expense);
        record
    }

    #[test]
    fn missing_dir_loads_empty() {
        let store = JsonStore::open(temp_dir());
        assert_eq!(store.load(), Snapshot::default());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(StoreKind::Balances.file_name()), "{ not json").unwrap();
        fs::write(dir.join(StoreKind::Members.file_name()), r#"{"g": ["1", "2"]}"#).unwrap();

        let snapshot = JsonStore::open(&dir).load();
        assert!(snapshot.balances.is_empty());
        assert_eq!(
            snapshot.members.get(&GroupId::from("g")),
            Some(&vec![UserId::new(1), UserId::new(2)])
        );
    }

    #[test]
    fn save_writes_string_keyed_files_and_reopens() {
        let dir = temp_dir();
        let group = GroupId::from("42");
        let store = JsonStore::open(&dir);
        store.save(&group, Some(&record()), &StoreKind::ALL).unwrap();

        let raw = fs::read_to_string(dir.join("balances.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["42"]["1"], "5.00");
        assert_eq!(value["42"]["2"], "-5.00");

        let reopened = JsonStore::open(&dir).load().into_records();
        assert_eq!(reopened.get(&group), Some(&record_without_time(&reopened[&group])));
    }

    fn record_without_time(loaded: &GroupRecord) -> GroupRecord {
        let mut expected = record();
        expected.expenses[0].timestamp = loaded.expenses[0].timestamp;
        expected
    }

    #[test]
    fn removing_a_group_only_touches_named_stores() {
        let dir = temp_dir();
        let group = GroupId::from("g");
        let store = JsonStore::open(&dir);
        store.save(&group, Some(&record()), &StoreKind::ALL).unwrap();
        store.save(&group, None, &[StoreKind::Members]).unwrap();

        let snapshot = JsonStore::open(&dir).load();
        assert!(snapshot.members.is_empty());
        assert!(snapshot.balances.contains_key(&group));
        assert!(snapshot.into_records().is_empty());
    }

    #[test]
    fn partial_save_restores_files_already_written() {
        let dir = temp_dir();
        let group = GroupId::from("g");
        let store = JsonStore::open(&dir);
        store.save(&group, Some(&record()), &StoreKind::ALL).unwrap();
        let before = fs::read_to_string(dir.join("expenses.json")).unwrap();

        // A directory in place of the temp file makes the balances write fail
        // after expenses.json has been rewritten.
        fs::create_dir_all(dir.join("balances.tmp")).unwrap();
        let mut changed = record();
        let extra = Expense::new(
            2,
            UserId::new(2),
            Money::new(4_00),
            "beer".to_string(),
            changed.members.clone(),
            Utc::now(),
        );
        extra.apply(&mut changed.balances).unwrap();
        changed.expenses.push(extra);

        let err = store.save(&group, Some(&changed), &StoreKind::ALL);
        assert!(matches!(err, Err(StoreError::Io(_))));

        assert_eq!(fs::read_to_string(dir.join("expenses.json")).unwrap(), before);
        let mirror = store.load();
        assert_eq!(mirror.expenses[&group].len(), 1);
        assert_eq!(mirror.balances[&group][&UserId::new(1)], Money::new(5_00));
    }

    #[test]
    fn memory_store_keeps_saved_records() {
        let store = MemoryStore::new();
        let group = GroupId::from("g");
        store.save(&group, Some(&record()), &[StoreKind::Balances]).unwrap();
        let snapshot = store.load();
        assert_eq!(snapshot.balances.len(), 1);
        assert!(snapshot.expenses.is_empty());
    }
}
