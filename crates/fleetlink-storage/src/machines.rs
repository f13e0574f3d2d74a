//! Machine record storage using redb.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use chrono::Utc;
use fleetlink_core::model::{LinkState, Machine};

use crate::Result;

// Machines table: key = machine id, value = Machine (JSON)
const MACHINES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("machines");

/// Machine record store using redb.
pub struct MachineStore {
    db: Arc<Database>,
}

impl MachineStore {
    /// Open or create a machine store at the given path.
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

        // Opening the table in a write transaction creates it on first use.
        let write_txn = db.begin_write()?;
        {
            let _table = write_txn.open_table(MACHINES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Insert or replace a machine record.
    pub fn save(&self, machine: &Machine) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MACHINES_TABLE)?;
            let json = serde_json::to_string(machine)?;
            table.insert(machine.id.as_str(), json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load a machine by id.
    pub fn get(&self, id: &str) -> Result<Option<Machine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MACHINES_TABLE)?;

        match table.get(id)? {
            Some(value) => {
                let machine: Machine = serde_json::from_str(value.value())?;
                Ok(Some(machine))
            }
            None => Ok(None),
        }
    }

    /// List all machines, optionally filtered by owning username.
    pub fn list(&self, username: Option<&str>) -> Result<Vec<Machine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MACHINES_TABLE)?;

        let mut machines = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let machine: Machine = serde_json::from_str(value.value())?;
            if let Some(username) = username {
                if machine.username != username {
                    continue;
                }
            }
            machines.push(machine);
        }

        Ok(machines)
    }

    /// All machines carrying a SIM number.
    ///
    /// SIM numbers are not unique: a multi-unit installation shares one
    /// cellular link, and every caller is expected to fan out over the
    /// full result.
    pub fn find_by_sim(&self, sim_number: &str) -> Result<Vec<Machine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MACHINES_TABLE)?;

        let mut machines = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let machine: Machine = serde_json::from_str(value.value())?;
            if machine.sim_number == sim_number {
                machines.push(machine);
            }
        }

        Ok(machines)
    }

    /// Delete a machine by id. Returns whether a record was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(MACHINES_TABLE)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Set every machine's status to OFFLINE. Returns the count updated.
    pub fn reset_all_status(&self) -> Result<usize> {
        let machines = self.list(None)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MACHINES_TABLE)?;
            for mut machine in machines.iter().cloned() {
                machine.status = LinkState::Offline;
                machine.updated_at = Utc::now();
                let json = serde_json::to_string(&machine)?;
                table.insert(machine.id.as_str(), json.as_str())?;
            }
        }
        write_txn.commit()?;

        Ok(machines.len())
    }
}

impl std::fmt::Debug for MachineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, MachineStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = MachineStore::open(dir.path().join("machines.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_save_and_get() {
        let (_dir, store) = store();
        let machine = Machine::new("Cab 1", "8944500101", "operator", "");

        store.save(&machine).unwrap();
        let loaded = store.get(&machine.id).unwrap().unwrap();
        assert_eq!(loaded.machine_name, "Cab 1");
        assert_eq!(loaded.sim_number, "8944500101");

        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_filters_by_username() {
        let (_dir, store) = store();
        store
            .save(&Machine::new("A", "1", "alice", ""))
            .unwrap();
        store.save(&Machine::new("B", "2", "bob", "")).unwrap();

        assert_eq!(store.list(None).unwrap().len(), 2);
        let alice = store.list(Some("alice")).unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].machine_name, "A");
    }

    #[test]
    fn test_find_by_sim_returns_all_matches() {
        let (_dir, store) = store();
        store
            .save(&Machine::new("Unit 1", "SIM1", "alice", ""))
            .unwrap();
        store
            .save(&Machine::new("Unit 2", "SIM1", "alice", ""))
            .unwrap();
        store
            .save(&Machine::new("Other", "SIM2", "bob", ""))
            .unwrap();

        assert_eq!(store.find_by_sim("SIM1").unwrap().len(), 2);
        assert_eq!(store.find_by_sim("SIM2").unwrap().len(), 1);
        assert!(store.find_by_sim("SIM9").unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = store();
        let machine = Machine::new("Cab 1", "1", "alice", "");
        store.save(&machine).unwrap();

        assert!(store.delete(&machine.id).unwrap());
        assert!(!store.delete(&machine.id).unwrap());
        assert!(store.get(&machine.id).unwrap().is_none());
    }

    #[test]
    fn test_reset_all_status() {
        let (_dir, store) = store();
        let mut machine = Machine::new("Cab 1", "1", "alice", "");
        machine.status = LinkState::Online;
        store.save(&machine).unwrap();

        assert_eq!(store.reset_all_status().unwrap(), 1);
        let loaded = store.get(&machine.id).unwrap().unwrap();
        assert_eq!(loaded.status, LinkState::Offline);
    }
}
