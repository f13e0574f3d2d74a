//! Operation log storage using redb.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use fleetlink_core::model::Operation;

use crate::Result;

// Operations table: key = operation id, value = Operation (JSON)
const OPERATIONS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("operations");

/// Most recent operations returned per machine.
pub const OPERATION_LIST_LIMIT: usize = 50;

/// Append-only operation log store using redb.
///
/// Records are created on JOB reports (or by an explicit insert) and
/// never mutated; the only removal path is an administrative delete.
pub struct OperationStore {
    db: Arc<Database>,
}

impl OperationStore {
    /// Open or create an operation store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = if path_ref.exists() {
            Database::open(path_ref)?
        } else {
            Database::create(path_ref)?
        };

        let write_txn = db.begin_write()?;
        {
            let _table = write_txn.open_table(OPERATIONS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Append an operation record.
    pub fn insert(&self, operation: &Operation) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(OPERATIONS_TABLE)?;
            let json = serde_json::to_string(operation)?;
            table.insert(operation.id.as_str(), json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// The most recent operations for one machine, newest first,
    /// capped at [`OPERATION_LIST_LIMIT`].
    pub fn list_for_machine(&self, machine_id: &str) -> Result<Vec<Operation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OPERATIONS_TABLE)?;

        let mut operations = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let operation: Operation = serde_json::from_str(value.value())?;
            if operation.machine_id == machine_id {
                operations.push(operation);
            }
        }

        operations.sort_by(|a, b| b.date_time.cmp(&a.date_time));
        operations.truncate(OPERATION_LIST_LIMIT);
        Ok(operations)
    }

    /// Delete an operation by id. Returns whether a record was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(OPERATIONS_TABLE)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }
}

impl std::fmt::Debug for OperationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn store() -> (tempfile::TempDir, OperationStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = OperationStore::open(dir.path().join("operations.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_and_list() {
        let (_dir, store) = store();

        store
            .insert(&Operation::new("m1", 10.0, 50.0, 30, "Site A"))
            .unwrap();
        store
            .insert(&Operation::new("m1", 11.0, 51.0, 31, "Site A"))
            .unwrap();
        store
            .insert(&Operation::new("m2", 12.0, 52.0, 32, "Site B"))
            .unwrap();

        assert_eq!(store.list_for_machine("m1").unwrap().len(), 2);
        assert_eq!(store.list_for_machine("m2").unwrap().len(), 1);
        assert!(store.list_for_machine("m3").unwrap().is_empty());
    }

    #[test]
    fn test_list_is_newest_first_and_capped() {
        let (_dir, store) = store();

        let base = Utc::now();
        for i in 0..55 {
            let mut op = Operation::new("m1", i as f64, 0.0, 0, "x");
            op.date_time = base + Duration::seconds(i);
            store.insert(&op).unwrap();
        }

        let listed = store.list_for_machine("m1").unwrap();
        assert_eq!(listed.len(), OPERATION_LIST_LIMIT);
        assert_eq!(listed[0].fuel_consumption, 54.0);
        assert!(listed[0].date_time > listed[1].date_time);
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = store();
        let op = Operation::new("m1", 1.0, 2.0, 3, "x");
        store.insert(&op).unwrap();

        assert!(store.delete(&op.id).unwrap());
        assert!(!store.delete(&op.id).unwrap());
    }
}
