use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use fintrack_domain::Identifiable;

use crate::error::{CoreError, CoreResult};

/// CRUD capability for one entity collection. Services never hold a
/// repository; callers load records, run a service, then write back.
pub trait Repository<T>: Send + Sync
where
    T: Identifiable + Clone,
{
    /// Collection name used in error messages and file names.
    fn collection(&self) -> &'static str;

    /// All records in insertion order.
    fn find_all(&self) -> CoreResult<Vec<T>>;

    fn find_by_id(&self, id: Uuid) -> CoreResult<Option<T>>;

    /// Fails when a record with the same id already exists.
    fn create(&self, record: T) -> CoreResult<T>;

    /// Fails when the record does not exist.
    fn update(&self, record: T) -> CoreResult<T>;

    /// Removes the record and returns it.
    fn delete(&self, id: Uuid) -> CoreResult<T>;

    fn get(&self, id: Uuid) -> CoreResult<T> {
        self.find_by_id(id)?.ok_or(CoreError::RecordNotFound {
            collection: self.collection(),
            id,
        })
    }
}

/// Process-local repository used by tests and embedding callers.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    collection: &'static str,
    records: Mutex<Vec<T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new(collection: &'static str) -> Self {
        Self {
            collection,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn with_records(collection: &'static str, records: Vec<T>) -> Self {
        Self {
            collection,
            records: Mutex::new(records),
        }
    }

    fn lock(&self) -> CoreResult<MutexGuard<'_, Vec<T>>> {
        self.records
            .lock()
            .map_err(|_| CoreError::Storage(format!("{} repository lock poisoned", self.collection)))
    }
}

impl<T> Repository<T> for InMemoryRepository<T>
where
    T: Identifiable + Clone + Send,
{
    fn collection(&self) -> &'static str {
        self.collection
    }

    fn find_all(&self) -> CoreResult<Vec<T>> {
        Ok(self.lock()?.clone())
    }

    fn find_by_id(&self, id: Uuid) -> CoreResult<Option<T>> {
        Ok(self.lock()?.iter().find(|record| record.id() == id).cloned())
    }

    fn create(&self, record: T) -> CoreResult<T> {
        let mut records = self.lock()?;
        if records.iter().any(|existing| existing.id() == record.id()) {
            return Err(CoreError::Validation(format!(
                "{} already contains {}",
                self.collection,
                record.id()
            )));
        }
        records.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: T) -> CoreResult<T> {
        let mut records = self.lock()?;
        let id = record.id();
        let slot = records
            .iter_mut()
            .find(|existing| existing.id() == id)
            .ok_or(CoreError::RecordNotFound {
                collection: self.collection,
                id,
            })?;
        *slot = record.clone();
        Ok(record)
    }

    fn delete(&self, id: Uuid) -> CoreResult<T> {
        let mut records = self.lock()?;
        let index = records
            .iter()
            .position(|existing| existing.id() == id)
            .ok_or(CoreError::RecordNotFound {
                collection: self.collection,
                id,
            })?;
        Ok(records.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintrack_domain::{Account, AccountKind};

    #[test]
    fn crud_round_trip_preserves_insertion_order() {
        let repo = InMemoryRepository::new("accounts");
        let first = repo.create(Account::new("Cash", AccountKind::Cash, "MVR")).unwrap();
        let second = repo.create(Account::new("Bank", AccountKind::Bank, "MVR")).unwrap();

        let names: Vec<_> = repo.find_all().unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["Cash", "Bank"]);

        let mut renamed = second.clone();
        renamed.name = "Savings".into();
        repo.update(renamed).unwrap();
        assert_eq!(repo.get(second.id).unwrap().name, "Savings");

        repo.delete(first.id).unwrap();
        assert!(repo.find_by_id(first.id).unwrap().is_none());
    }

    #[test]
    fn missing_records_are_reference_errors() {
        let repo: InMemoryRepository<Account> = InMemoryRepository::new("accounts");
        let err = repo.delete(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Reference);
        assert!(repo.update(Account::new("Ghost", AccountKind::Cash, "MVR")).is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let repo = InMemoryRepository::new("accounts");
        let account = Account::new("Cash", AccountKind::Cash, "MVR");
        repo.create(account.clone()).unwrap();
        assert!(repo.create(account).is_err());
    }
}
