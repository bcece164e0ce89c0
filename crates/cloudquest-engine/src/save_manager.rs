//! JSON file progress store.
//!
//! One slot is one `{slot}.json` file. Writes go to `{slot}.tmp` first and
//! are renamed into place so a crash mid-write never leaves a torn save.

use cloudquest_common::{StoreError, StoreResult};
use cloudquest_gameplay::{ProgressRecord, ProgressStore};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of save files.
const SAVE_EXTENSION: &str = "json";

/// Extension of in-flight writes.
const TEMP_EXTENSION: &str = "tmp";

/// Characters not allowed in slot names.
const INVALID_SLOT_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Progress store backed by a JSON file in a save directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    save_dir: PathBuf,
    slot: String,
}

impl JsonFileStore {
    /// Creates a store for `slot` inside `save_dir`. The directory is created
    /// on first save.
    pub fn new(save_dir: impl Into<PathBuf>, slot: impl Into<String>) -> StoreResult<Self> {
        let slot = slot.into();
        Self::validate_slot_name(&slot)?;
        Ok(Self {
            save_dir: save_dir.into(),
            slot,
        })
    }

    /// Validates a slot name.
    fn validate_slot_name(slot: &str) -> StoreResult<()> {
        if slot.is_empty() {
            return Err(StoreError::InvalidSlot("Empty slot name".to_string()));
        }

        for c in INVALID_SLOT_CHARS {
            if slot.contains(c) {
                return Err(StoreError::InvalidSlot(format!(
                    "Invalid character '{c}' in slot name"
                )));
            }
        }

        Ok(())
    }

    /// Save directory.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Slot name.
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Path of the save file.
    #[must_use]
    pub fn slot_path(&self) -> PathBuf {
        self.save_dir.join(format!("{}.{SAVE_EXTENSION}", self.slot))
    }

    fn temp_path(&self) -> PathBuf {
        self.save_dir.join(format!("{}.{TEMP_EXTENSION}", self.slot))
    }

    /// Whether a save file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.slot_path().exists()
    }

    /// Deletes the save file if present.
    pub fn delete(&self) -> StoreResult<()> {
        let path = self.slot_path();
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Deleted save: {}", path.display());
        }
        Ok(())
    }

    fn atomic_write(&self, record: &ProgressRecord) -> StoreResult<()> {
        let temp_path = self.temp_path();
        let final_path = self.slot_path();

        // Write to temp file
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);

            serde_json::to_writer_pretty(&mut writer, record)?;

            writer.flush()?;
        }

        // Atomic rename
        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StoreError::Io(e)
        })?;

        debug!("Atomic write complete for slot: {}", self.slot);
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> StoreResult<Option<ProgressRecord>> {
        let path = self.slot_path();
        if !path.exists() {
            debug!("No save at {}", path.display());
            return Ok(None);
        }

        let file = File::open(&path)?;
        let record: ProgressRecord = serde_json::from_reader(BufReader::new(file))?;
        record.check_version()?;

        info!("Loaded progress from {}", path.display());
        Ok(Some(record))
    }

    fn save(&self, record: &ProgressRecord) -> StoreResult<()> {
        fs::create_dir_all(&self.save_dir)?;
        self.atomic_write(record)?;
        info!("Saved progress to {}", self.slot_path().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudquest_common::SchemaVersion;
    use cloudquest_gameplay::load_or_fresh;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("saves"), "progress").expect("valid slot")
    }

    #[test]
    fn test_slot_name_validation() {
        assert!(JsonFileStore::new("saves", "slot_1").is_ok());
        assert!(matches!(
            JsonFileStore::new("saves", ""),
            Err(StoreError::InvalidSlot(_))
        ));
        for bad in ["a/b", "a\\b", "a:b", "a*b", "a?b", "a\"b", "a<b", "a>b", "a|b"] {
            assert!(JsonFileStore::new("saves", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);
        assert!(!store.exists());
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);
        let record = ProgressRecord {
            level: 3,
            experience: 40,
            total_experience: 340,
            learned_concepts: vec!["ec2_basics".into(), "s3_storage".into()],
            unlocked_content: vec!["compute_valley".into()],
            ..ProgressRecord::default()
        };

        store.save(&record).expect("save");
        assert!(store.exists());
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().expect("load"), Some(record));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);
        store.save(&ProgressRecord::default()).expect("first save");
        let second = ProgressRecord {
            level: 7,
            ..ProgressRecord::default()
        };
        store.save(&second).expect("second save");
        assert_eq!(store.load().expect("load").map(|r| r.level), Some(7));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);
        fs::create_dir_all(store.save_dir()).expect("mkdir");
        fs::write(store.slot_path(), "{ definitely not json").expect("write");

        assert!(matches!(store.load(), Err(StoreError::Serialization(_))));
        assert!(load_or_fresh(&store).is_none());
    }

    #[test]
    fn test_newer_major_version_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);
        let record = ProgressRecord {
            version: SchemaVersion::new(2, 0, 0),
            ..ProgressRecord::default()
        };
        store.save(&record).expect("save");
        assert!(matches!(store.load(), Err(StoreError::Incompatible { .. })));
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);
        store.save(&ProgressRecord::default()).expect("save");
        store.delete().expect("delete");
        assert!(!store.exists());
        store.delete().expect("deleting nothing is fine");
    }
}
