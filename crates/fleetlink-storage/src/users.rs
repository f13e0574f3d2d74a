//! User account storage using redb.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use fleetlink_core::model::User;

use crate::Result;

// Users table: key = user id, value = User (JSON)
const USERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("users");

/// User record store using redb.
pub struct UserStore {
    db: Arc<Database>,
}

impl UserStore {
    /// Open or create a user store at the given path.
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
            let _table = write_txn.open_table(USERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Insert or replace a user record.
    pub fn save(&self, user: &User) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS_TABLE)?;
            let json = serde_json::to_string(user)?;
            table.insert(user.id.as_str(), json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// List all users.
    pub fn list(&self) -> Result<Vec<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;

        let mut users = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            users.push(serde_json::from_str(value.value())?);
        }
        Ok(users)
    }

    /// Find a user by username.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|user| user.username == username))
    }

    /// Delete a user by id. Returns whether a record was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(USERS_TABLE)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Adjust a user's machine count by `delta`, clamped at zero.
    /// Unknown usernames are a no-op: machines may outlive their owner.
    pub fn adjust_machine_count(&self, username: &str, delta: i64) -> Result<()> {
        let Some(mut user) = self.find_by_username(username)? else {
            return Ok(());
        };
        user.machine_count = (user.machine_count + delta).max(0);
        self.save(&user)
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::open(dir.path().join("users.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_save_list_delete() {
        let (_dir, store) = store();
        let user = User::new("Alice", "alice", "alice@example.com");

        store.save(&user).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);

        assert!(store.delete(&user.id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_adjust_machine_count() {
        let (_dir, store) = store();
        store
            .save(&User::new("Alice", "alice", "alice@example.com"))
            .unwrap();

        store.adjust_machine_count("alice", 1).unwrap();
        store.adjust_machine_count("alice", 1).unwrap();
        store.adjust_machine_count("alice", -1).unwrap();
        let user = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(user.machine_count, 1);

        // Never below zero, unknown users ignored.
        store.adjust_machine_count("alice", -5).unwrap();
        assert_eq!(
            store.find_by_username("alice").unwrap().unwrap().machine_count,
            0
        );
        store.adjust_machine_count("nobody", 1).unwrap();
    }
}
