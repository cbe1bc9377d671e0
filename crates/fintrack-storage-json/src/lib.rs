//! fintrack-storage-json
//!
//! File-backed [`Repository`] implementation. Each collection lives in one
//! JSON array file under the store root and every write replaces the file
//! atomically.

pub mod legacy;

use std::{
    fs::{self, File},
    io::Write,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use fintrack_core::{CoreError, CoreResult, Repository};
use fintrack_domain::{
    Account, BillSplit, Budget, Identifiable, Loan, RecurringItem, SavingsGoal, Transaction,
};

pub use legacy::normalize_schedule;

const FILE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// A record type that can be persisted by [`JsonRepository`].
pub trait StoredRecord: Identifiable + Clone + Serialize + DeserializeOwned + Send + Sync {
    /// File stem of the collection.
    const COLLECTION: &'static str;

    /// Rewrites a raw stored value into the current shape before it is
    /// deserialized. The default handles legacy key spellings.
    fn upgrade(value: Value) -> Value {
        legacy::upgrade_keys(value)
    }
}

impl StoredRecord for Account {
    const COLLECTION: &'static str = "accounts";
}

impl StoredRecord for Transaction {
    const COLLECTION: &'static str = "transactions";

    fn upgrade(value: Value) -> Value {
        let mut value = legacy::upgrade_keys(value);
        legacy::lift_transaction_metadata(&mut value);
        value
    }
}

impl StoredRecord for Loan {
    const COLLECTION: &'static str = "loans";

    fn upgrade(value: Value) -> Value {
        let mut value = value;
        let schedule = value
            .as_object_mut()
            .and_then(|record| record.remove("schedule"))
            .unwrap_or(Value::Null);
        let mut value = legacy::upgrade_keys(value);
        let entries = normalize_schedule(&schedule);
        if let (Some(record), Ok(entries)) = (value.as_object_mut(), serde_json::to_value(entries)) {
            record.insert("schedule".into(), entries);
        }
        value
    }
}

impl StoredRecord for BillSplit {
    const COLLECTION: &'static str = "bill_splits";
}

impl StoredRecord for Budget {
    const COLLECTION: &'static str = "budgets";
}

impl StoredRecord for SavingsGoal {
    const COLLECTION: &'static str = "savings_goals";
}

impl StoredRecord for RecurringItem {
    const COLLECTION: &'static str = "recurring_items";
}

/// Root directory holding one file per collection.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: PathBuf) -> CoreResult<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.{}", collection, FILE_EXTENSION))
    }

    pub fn repository<T: StoredRecord>(&self) -> JsonRepository<T> {
        JsonRepository::new(self.collection_path(T::COLLECTION))
    }
}

/// Repository over a single JSON array file. Reads tolerate a missing file;
/// a record that fails to deserialize aborts the read with a storage error.
#[derive(Debug)]
pub struct JsonRepository<T> {
    path: PathBuf,
    guard: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T: StoredRecord> JsonRepository<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            guard: Mutex::new(()),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| CoreError::Storage(format!("{} file lock poisoned", T::COLLECTION)))
    }

    fn read(&self) -> CoreResult<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        let raw: Value = serde_json::from_str(&data).map_err(|err| storage_error(&self.path, err))?;
        let rows = match raw {
            Value::Array(rows) => rows,
            other => {
                warn!(collection = T::COLLECTION, "collection file is not an array; reading as one record");
                vec![other]
            }
        };
        rows.into_iter()
            .map(|row| serde_json::from_value(T::upgrade(row)).map_err(|err| storage_error(&self.path, err)))
            .collect()
    }

    fn write(&self, records: &[T]) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records).map_err(|err| storage_error(&self.path, err))?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(collection = T::COLLECTION, records = records.len(), "wrote collection file");
        Ok(())
    }
}

impl<T: StoredRecord> Repository<T> for JsonRepository<T> {
    fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    fn find_all(&self) -> CoreResult<Vec<T>> {
        let _guard = self.lock()?;
        self.read()
    }

    fn find_by_id(&self, id: Uuid) -> CoreResult<Option<T>> {
        let _guard = self.lock()?;
        Ok(self.read()?.into_iter().find(|record| record.id() == id))
    }

    fn create(&self, record: T) -> CoreResult<T> {
        let _guard = self.lock()?;
        let mut records = self.read()?;
        if records.iter().any(|existing| existing.id() == record.id()) {
            return Err(CoreError::Validation(format!(
                "{} already contains {}",
                T::COLLECTION,
                record.id()
            )));
        }
        records.push(record.clone());
        self.write(&records)?;
        Ok(record)
    }

    fn update(&self, record: T) -> CoreResult<T> {
        let _guard = self.lock()?;
        let mut records = self.read()?;
        let id = record.id();
        let slot = records
            .iter_mut()
            .find(|existing| existing.id() == id)
            .ok_or(CoreError::RecordNotFound {
                collection: T::COLLECTION,
                id,
            })?;
        *slot = record.clone();
        self.write(&records)?;
        Ok(record)
    }

    fn delete(&self, id: Uuid) -> CoreResult<T> {
        let _guard = self.lock()?;
        let mut records = self.read()?;
        let index = records
            .iter()
            .position(|existing| existing.id() == id)
            .ok_or(CoreError::RecordNotFound {
                collection: T::COLLECTION,
                id,
            })?;
        let removed = records.remove(index);
        self.write(&records)?;
        Ok(removed)
    }
}

fn storage_error(path: &Path, err: serde_json::Error) -> CoreError {
    CoreError::Storage(format!("{}: {}", path.display(), err))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> CoreResult<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
