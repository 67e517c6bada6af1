//! File-backed storage adapter.

use crate::adapter::{upsert_by_merge_key, StorageAdapter};
use crate::error::StoreResult;
use kudosync_model::{Attachment, Exercise, PendingMutation, Profile};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const EXERCISES_FILE: &str = "exercises.json";
const MUTATIONS_FILE: &str = "mutations.json";
const PROFILE_FILE: &str = "profile.json";
const ATTACHMENTS_FILE: &str = "attachments.json";

/// Single-blob format written by the previous client generation.
const LEGACY_FILE: &str = "store.json";

/// A file-backed storage adapter.
///
/// Each logical table lives in its own JSON file under a root
/// directory. Writes rewrite the whole table through a temp file and
/// rename, so a crashed write leaves the previous table intact. A
/// single write lock serializes all writes for the store instance.
///
/// # Recovery
///
/// A table file that fails to parse is treated as empty and logged as a
/// warning; read operations never fail on corrupted data. The legacy
/// single-file format from the previous client is detected on open,
/// split into the table files, and erased.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyStore {
    #[serde(default)]
    exercises: Vec<Exercise>,
    #[serde(default)]
    pending_mutations: Vec<PendingMutation>,
    #[serde(default)]
    user: Option<Profile>,
}

impl FileStore {
    /// Opens a file store rooted at `path`, creating the directory if
    /// needed and migrating the legacy single-file format if present.
    pub fn open(path: &Path) -> StoreResult<Self> {
        fs::create_dir_all(path)?;
        let store = Self {
            root: path.to_path_buf(),
            write_lock: Mutex::new(()),
        };
        store.migrate_legacy()?;
        Ok(store)
    }

    /// Returns the root directory of this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Reads a table, recovering from missing or corrupted files.
    fn read_table<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.table_path(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return T::default(),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!(table = name, error = %err, "corrupted table file, using empty default");
                T::default()
            }
        }
    }

    /// Rewrites a table atomically: temp file in the same directory,
    /// then rename over the old table.
    fn write_table<T: Serialize>(&self, name: &str, value: &T) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        self.write_table_locked(name, value)
    }

    /// Write path for callers that already hold the write lock.
    fn write_table_locked<T: Serialize>(&self, name: &str, value: &T) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;

        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = self.table_path(&format!("{name}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, self.table_path(name))?;
        Ok(())
    }

    /// Splits a legacy `store.json` blob into the table layout, then
    /// erases it. Unparseable legacy data is logged and discarded.
    fn migrate_legacy(&self) -> StoreResult<()> {
        let legacy_path = self.table_path(LEGACY_FILE);
        let Ok(bytes) = fs::read(&legacy_path) else {
            return Ok(());
        };

        // Never clobber tables that already exist from a newer run.
        if !self.table_path(EXERCISES_FILE).exists() {
            match serde_json::from_slice::<LegacyStore>(&bytes) {
                Ok(legacy) => {
                    info!(
                        exercises = legacy.exercises.len(),
                        mutations = legacy.pending_mutations.len(),
                        "migrating legacy store format"
                    );
                    self.replace_exercises(&legacy.exercises)?;
                    self.set_pending_mutations(&legacy.pending_mutations)?;
                    self.save_user(legacy.user.as_ref())?;
                }
                Err(err) => {
                    warn!(error = %err, "legacy store unreadable, discarding");
                }
            }
        }

        fs::remove_file(&legacy_path)?;
        Ok(())
    }
}

impl StorageAdapter for FileStore {
    fn get_exercises(&self) -> StoreResult<Vec<Exercise>> {
        Ok(self.read_table(EXERCISES_FILE))
    }

    fn bulk_upsert_exercises(&self, records: &[Exercise]) -> StoreResult<()> {
        // Lock covers the read-modify-write, not just the write.
        let _guard = self.write_lock.lock();
        let mut table: Vec<Exercise> = self.read_table(EXERCISES_FILE);
        upsert_by_merge_key(&mut table, records);
        self.write_table_locked(EXERCISES_FILE, &table)
    }

    fn replace_exercises(&self, records: &[Exercise]) -> StoreResult<()> {
        self.write_table(EXERCISES_FILE, &records)
    }

    fn count_exercises(&self) -> StoreResult<usize> {
        Ok(self.read_table::<Vec<Exercise>>(EXERCISES_FILE).len())
    }

    fn get_pending_mutations(&self) -> StoreResult<Vec<PendingMutation>> {
        Ok(self.read_table(MUTATIONS_FILE))
    }

    fn set_pending_mutations(&self, mutations: &[PendingMutation]) -> StoreResult<()> {
        self.write_table(MUTATIONS_FILE, &mutations)
    }

    fn get_user(&self) -> StoreResult<Option<Profile>> {
        Ok(self.read_table(PROFILE_FILE))
    }

    fn save_user(&self, profile: Option<&Profile>) -> StoreResult<()> {
        self.write_table(PROFILE_FILE, &profile)
    }

    fn save_attachment(&self, key: &str, data: &str, mime_type: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let mut table: HashMap<String, Attachment> = self.read_table(ATTACHMENTS_FILE);
        table.insert(key.to_string(), Attachment::new(key, data, mime_type));
        self.write_table_locked(ATTACHMENTS_FILE, &table)
    }

    fn get_attachment(&self, key: &str) -> StoreResult<Option<Attachment>> {
        let table: HashMap<String, Attachment> = self.read_table(ATTACHMENTS_FILE);
        Ok(table.get(key).cloned())
    }

    fn delete_attachment(&self, key: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let mut table: HashMap<String, Attachment> = self.read_table(ATTACHMENTS_FILE);
        if table.remove(key).is_some() {
            self.write_table_locked(ATTACHMENTS_FILE, &table)?;
        }
        Ok(())
    }
}
