use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{RoleRecord, UserRecord, UserRoleRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential file {path} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Account and role lookups needed to authenticate and authorize requests.
pub trait CredentialDirectory: Send + Sync {
    /// Case-insensitive lookup.
    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Inserts the account with the given roles unless the username is taken.
    /// Roles are created on demand and reused by name.
    fn create_if_absent(
        &self,
        username: &str,
        password_hash: &str,
        roles: &[&str],
        confirmed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError>;

    fn roles_of(&self, user_id: u64) -> Result<Vec<RoleRecord>, StoreError>;

    fn list_accounts(&self) -> Result<Vec<(UserRecord, Vec<RoleRecord>)>, StoreError>;
}

#[derive(Default, Clone, Serialize, Deserialize)]
struct CredentialTables {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    roles: Vec<RoleRecord>,
    #[serde(default)]
    user_roles: Vec<UserRoleRecord>,
}

impl CredentialTables {
    fn next_id<T>(rows: &[T], id: impl Fn(&T) -> u64) -> u64 {
        rows.iter().map(id).max().unwrap_or(0) + 1
    }

    fn role_id(&mut self, name: &str) -> u64 {
        if let Some(role) = self.roles.iter().find(|r| r.name == name) {
            return role.id;
        }
        let id = Self::next_id(&self.roles, |r| r.id);
        self.roles.push(RoleRecord {
            id,
            name: name.to_string(),
        });
        id
    }

    fn roles_of(&self, user_id: u64) -> Vec<RoleRecord> {
        self.user_roles
            .iter()
            .filter(|link| link.user_id == user_id)
            .filter_map(|link| self.roles.iter().find(|r| r.id == link.role_id))
            .cloned()
            .collect()
    }
}

/// Users, roles and their association kept in a single JSON document.
/// Without a path the directory lives only in memory.
pub struct JsonCredentialStore {
    path: Option<PathBuf>,
    tables: Mutex<CredentialTables>,
}

impl JsonCredentialStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?
        } else {
            CredentialTables::default()
        };
        Ok(JsonCredentialStore {
            path: Some(path),
            tables: Mutex::new(tables),
        })
    }

    pub fn in_memory() -> Self {
        JsonCredentialStore {
            path: None,
            tables: Mutex::new(CredentialTables::default()),
        }
    }

    fn persist(&self, tables: &CredentialTables) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(tables).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }
}

impl CredentialDirectory for JsonCredentialStore {
    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let uname = username.trim().to_lowercase();
        let tables = self.tables.lock();
        Ok(tables.users.iter().find(|u| u.username == uname).cloned())
    }

    fn create_if_absent(
        &self,
        username: &str,
        password_hash: &str,
        roles: &[&str],
        confirmed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let uname = username.trim().to_lowercase();
        let mut current = self.tables.lock();
        if current.users.iter().any(|u| u.username == uname) {
            return Ok(false);
        }

        // Changes go to a copy that replaces the live tables only once it is
        // on disk.
        let mut tables = current.clone();

        let user_id = CredentialTables::next_id(&tables.users, |u| u.id);
        tables.users.push(UserRecord {
            id: user_id,
            active: true,
            username: uname,
            password: password_hash.to_string(),
            email_confirmed_at: confirmed_at,
            first_name: String::new(),
            last_name: String::new(),
        });
        for name in roles {
            let role_id = tables.role_id(name);
            let link_id = CredentialTables::next_id(&tables.user_roles, |l| l.id);
            tables.user_roles.push(UserRoleRecord {
                id: link_id,
                user_id,
                role_id,
            });
        }

        self.persist(&tables)?;
        *current = tables;
        Ok(true)
    }

    fn roles_of(&self, user_id: u64) -> Result<Vec<RoleRecord>, StoreError> {
        Ok(self.tables.lock().roles_of(user_id))
    }

    fn list_accounts(&self) -> Result<Vec<(UserRecord, Vec<RoleRecord>)>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables
            .users
            .iter()
            .map(|u| (u.clone(), tables.roles_of(u.id)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_case_insensitive_and_unique() {
        let store = JsonCredentialStore::in_memory();
        assert!(store.create_if_absent("Alice", "h1", &["SuperAdmin"], None).unwrap());
        assert!(!store.create_if_absent("ALICE", "h2", &[], None).unwrap());

        let found = store.find_by_username("aLiCe").unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.password, "h1");
    }

    #[test]
    fn role_names_are_reused() {
        let store = JsonCredentialStore::in_memory();
        store.create_if_absent("a", "h", &["SuperAdmin"], None).unwrap();
        store.create_if_absent("b", "h", &["SuperAdmin", "Viewer"], None).unwrap();

        let accounts = store.list_accounts().unwrap();
        let roles: Vec<RoleRecord> = accounts.iter().flat_map(|(_, r)| r.clone()).collect();
        let super_ids: Vec<u64> = roles
            .iter()
            .filter(|r| r.name == "SuperAdmin")
            .map(|r| r.id)
            .collect();
        assert_eq!(super_ids.len(), 2);
        assert_eq!(super_ids[0], super_ids[1]);
        assert_eq!(store.roles_of(accounts[1].0.id).unwrap().len(), 2);
    }

    #[test]
    fn file_store_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        {
            let store = JsonCredentialStore::open(&path).unwrap();
            store
                .create_if_absent("admin", "hash", &["SuperAdmin"], Some(Utc::now()))
                .unwrap();
        }
        let reopened = JsonCredentialStore::open(&path).unwrap();
        let admin = reopened.find_by_username("admin").unwrap().unwrap();
        assert!(admin.active);
        assert!(admin.email_confirmed_at.is_some());
        let roles = reopened.roles_of(admin.id).unwrap();
        assert_eq!(roles[0].name, "SuperAdmin");
    }

    #[test]
    fn failed_write_leaves_directory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("users.json");
        let store = JsonCredentialStore::open(&path).unwrap();

        let err = store.create_if_absent("admin", "h", &["SuperAdmin"], None).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(store.find_by_username("admin").unwrap().is_none());
        assert!(store.list_accounts().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonCredentialStore::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
