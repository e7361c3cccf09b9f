//! The storage facade (§4.5/§9): a small typed façade with one
//! already-typed accessor per key, rather than a single untyped blob. Two
//! implementations ship: `MemoryStorage` for tests and embedders who manage
//! persistence themselves, and `JsonFileStorage` for a simple on-disk host.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::info;

use crate::error::StorageError;
use crate::expense::Expense;
use crate::groups::GroupDirectory;
use crate::ledger::Ledger;

pub trait Storage {
    fn load_history(&self) -> Result<Vec<Expense>, StorageError>;
    fn save_history(&self, history: &[Expense]) -> Result<(), StorageError>;
    fn load_ledger(&self) -> Result<Ledger, StorageError>;
    fn save_ledger(&self, ledger: &Ledger) -> Result<(), StorageError>;
    fn load_groups(&self) -> Result<GroupDirectory, StorageError>;
    fn save_groups(&self, groups: &GroupDirectory) -> Result<(), StorageError>;
}

/// An in-memory `Storage`, useful for tests and for library consumers who
/// own persistence themselves.
#[derive(Default)]
pub struct MemoryStorage {
    history: Mutex<Vec<Expense>>,
    ledger: Mutex<Ledger>,
    groups: Mutex<GroupDirectory>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }
}

impl Storage for MemoryStorage {
    fn load_history(&self) -> Result<Vec<Expense>, StorageError> {
        Ok(self.history.lock().unwrap().clone())
    }

    fn save_history(&self, history: &[Expense]) -> Result<(), StorageError> {
        *self.history.lock().unwrap() = history.to_vec();
        Ok(())
    }

    fn load_ledger(&self) -> Result<Ledger, StorageError> {
        Ok(self.ledger.lock().unwrap().clone())
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<(), StorageError> {
        *self.ledger.lock().unwrap() = ledger.clone();
        Ok(())
    }

    fn load_groups(&self) -> Result<GroupDirectory, StorageError> {
        Ok(self.groups.lock().unwrap().clone())
    }

    fn save_groups(&self, groups: &GroupDirectory) -> Result<(), StorageError> {
        *self.groups.lock().unwrap() = groups.clone();
        Ok(())
    }
}

/// A `Storage` backed by one JSON file per key in a directory. Each save
/// writes to a temp file and renames it into place, so a crash mid-write
/// never leaves a half-written key behind.
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<JsonFileStorage, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(JsonFileStorage { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn load<T: Default + serde::de::DeserializeOwned>(&self, key: &str) -> Result<T, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(T::default());
        }
        let contents = fs::read_to_string(&path).map_err(|source| StorageError::Read {
            path: path.display().to_string(),
            source,
        })?;
        info!("loaded {key} from {}", path.display());
        Ok(serde_json::from_str(&contents)?)
    }

    fn save<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp_path = self.path_for(&format!("{key}.tmp"));
        let contents = serde_json::to_string_pretty(value)?;
        fs::write(&tmp_path, contents).map_err(|source| StorageError::Write {
            path: tmp_path.display().to_string(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| StorageError::Write {
            path: path.display().to_string(),
            source,
        })?;
        info!("saved {key} to {}", path.display());
        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn load_history(&self) -> Result<Vec<Expense>, StorageError> {
        self.load("history")
    }

    fn save_history(&self, history: &[Expense]) -> Result<(), StorageError> {
        self.save("history", &history.to_vec())
    }

    fn load_ledger(&self) -> Result<Ledger, StorageError> {
        self.load("ledger")
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<(), StorageError> {
        self.save("ledger", ledger)
    }

    fn load_groups(&self) -> Result<GroupDirectory, StorageError> {
        self.load("groups")
    }

    fn save_groups(&self, groups: &GroupDirectory) -> Result<(), StorageError> {
        self.save("groups", groups)
    }
}

impl AsRef<Path> for JsonFileStorage {
    fn as_ref(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::{DraftParticipant, ExpenseBuilder};
    use crate::money::Money;
    use crate::user::User;
    use chrono::{DateTime, Utc};

    fn sample_expense() -> Expense {
        let mut b = ExpenseBuilder::new(
            DateTime::<Utc>::MIN_UTC,
            None,
            Money::parse("10").unwrap(),
            User::new("AA"),
        );
        b.add_participant(DraftParticipant::new(User::new("AA")));
        b.finalize().unwrap()
    }

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryStorage::new();
        assert!(storage.load_history().unwrap().is_empty());

        storage.save_history(&[sample_expense()]).unwrap();
        assert_eq!(storage.load_history().unwrap().len(), 1);

        let mut ledger = Ledger::new();
        ledger.apply_expense(&sample_expense());
        storage.save_ledger(&ledger).unwrap();
        assert_eq!(
            storage.load_ledger().unwrap().balance_of(&User::new("AA")),
            ledger.balance_of(&User::new("AA"))
        );

        let mut groups = GroupDirectory::new();
        groups.create("FRIENDS").unwrap();
        storage.save_groups(&groups).unwrap();
        assert!(storage.load_groups().unwrap().members("FRIENDS").is_some());
    }

    #[test]
    fn json_file_storage_initializes_missing_keys_to_empty() {
        let dir = std::env::temp_dir().join(format!("ledger-engine-test-{}", std::process::id()));
        let storage = JsonFileStorage::new(&dir).unwrap();
        assert!(storage.load_history().unwrap().is_empty());
        assert!(storage.load_ledger().unwrap().is_empty());
        assert!(storage.load_groups().unwrap().members("ANY").is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn json_file_storage_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("ledger-engine-test2-{}", std::process::id()));
        let storage = JsonFileStorage::new(&dir).unwrap();
        let mut ledger = Ledger::new();
        ledger.apply_expense(&sample_expense());
        storage.save_ledger(&ledger).unwrap();

        let reloaded = JsonFileStorage::new(&dir).unwrap();
        assert_eq!(
            reloaded.load_ledger().unwrap().balance_of(&User::new("AA")),
            ledger.balance_of(&User::new("AA"))
        );
        let _ = fs::remove_dir_all(&dir);
    }
}
