//! Progress persistence.
//!
//! Progress is one flat record. Where it goes is up to the [`ProgressStore`]
//! implementation: the engine writes JSON files, tests use [`MemoryStore`].

use cloudquest_common::{SchemaVersion, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::progress::{AchievementState, CombatStats, ExplorationStats, LearningStats};

/// Everything that survives between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Schema version the record was written with
    pub version: SchemaVersion,
    /// Player level
    pub level: u32,
    /// Experience toward the next level
    pub experience: u32,
    /// Experience ever gained
    pub total_experience: u64,
    /// Learning statistics
    #[serde(default)]
    pub learning: LearningStats,
    /// Combat statistics
    #[serde(default)]
    pub combat: CombatStats,
    /// Exploration statistics
    #[serde(default)]
    pub exploration: ExplorationStats,
    /// Achievement states by id
    #[serde(default)]
    pub achievements: BTreeMap<String, AchievementState>,
    /// Learned concept ids
    #[serde(default)]
    pub learned_concepts: Vec<String>,
    /// Unlocked ability ids
    #[serde(default)]
    pub unlocked_abilities: Vec<String>,
    /// Equipped ability ids in loadout order
    #[serde(default)]
    pub equipped_abilities: Vec<String>,
    /// Unlocked progression content ids
    #[serde(default)]
    pub unlocked_content: Vec<String>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            version: SchemaVersion::PROGRESS_RECORD,
            level: 1,
            experience: 0,
            total_experience: 0,
            learning: LearningStats::default(),
            combat: CombatStats::default(),
            exploration: ExplorationStats::default(),
            achievements: BTreeMap::new(),
            learned_concepts: Vec::new(),
            unlocked_abilities: Vec::new(),
            equipped_abilities: Vec::new(),
            unlocked_content: Vec::new(),
        }
    }
}

impl ProgressRecord {
    /// Rejects records this build cannot read.
    pub fn check_version(&self) -> StoreResult<()> {
        if SchemaVersion::PROGRESS_RECORD.can_read(&self.version) {
            Ok(())
        } else {
            Err(StoreError::Incompatible {
                expected: SchemaVersion::PROGRESS_RECORD,
                found: self.version,
            })
        }
    }

    /// Parses a record from JSON and checks its version.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let record: Self = serde_json::from_str(json)?;
        record.check_version()?;
        Ok(record)
    }

    /// Serializes the record as pretty JSON.
    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Somewhere a single save slot of progress can be kept.
pub trait ProgressStore {
    /// Loads the saved record, or `None` if nothing has been saved.
    fn load(&self) -> StoreResult<Option<ProgressRecord>>;

    /// Replaces the saved record.
    fn save(&self, record: &ProgressRecord) -> StoreResult<()>;
}

/// Loads a record, treating every failure as "no saved progress".
pub fn load_or_fresh(store: &dyn ProgressStore) -> Option<ProgressRecord> {
    match store.load() {
        Ok(record) => record,
        Err(e) => {
            warn!("Failed to load progress, starting fresh: {e}");
            None
        },
    }
}

/// In-memory store holding serialized JSON.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with raw contents.
    #[must_use]
    pub fn with_contents(json: impl Into<String>) -> Self {
        Self {
            data: Mutex::new(Some(json.into())),
        }
    }

    /// Raw stored contents.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.data.lock().ok().and_then(|d| d.clone())
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> StoreResult<Option<ProgressRecord>> {
        let data = self
            .data
            .lock()
            .map_err(|_| StoreError::Serialization("store lock poisoned".into()))?;
        match data.as_deref() {
            Some(json) => ProgressRecord::from_json(json).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, record: &ProgressRecord) -> StoreResult<()> {
        let json = record.to_json()?;
        let mut data = self
            .data
            .lock()
            .map_err(|_| StoreError::Serialization("store lock poisoned".into()))?;
        *data = Some(json);
        debug!("Saved progress to memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_loads_none() {
        let store = MemoryStore::new();
        assert!(store.load().expect("load").is_none());
        assert!(load_or_fresh(&store).is_none());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let record = ProgressRecord {
            level: 4,
            experience: 12,
            learned_concepts: vec!["ec2_basics".into()],
            equipped_abilities: vec!["auto_scaling".into()],
            ..ProgressRecord::default()
        };
        store.save(&record).expect("save");
        assert_eq!(store.load().expect("load"), Some(record));
    }

    #[test]
    fn test_corrupt_contents_fall_back() {
        let store = MemoryStore::with_contents("{ not json");
        assert!(matches!(store.load(), Err(StoreError::Serialization(_))));
        assert!(load_or_fresh(&store).is_none());
    }

    #[test]
    fn test_incompatible_version_rejected() {
        let json = r#"{
            "version": { "major": 2, "minor": 0, "patch": 0 },
            "level": 9, "experience": 0, "total_experience": 0
        }"#;
        let store = MemoryStore::with_contents(json);
        assert!(matches!(store.load(), Err(StoreError::Incompatible { .. })));
        assert!(load_or_fresh(&store).is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let json = r#"{
            "version": { "major": 1, "minor": 0, "patch": 0 },
            "level": 2, "experience": 30, "total_experience": 130
        }"#;
        let record = ProgressRecord::from_json(json).expect("parse");
        assert_eq!(record.level, 2);
        assert!(record.achievements.is_empty());
        assert!(record.unlocked_content.is_empty());
    }
}
