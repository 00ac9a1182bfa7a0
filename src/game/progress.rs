// game/progress.rs

use super::level::{LevelCatalog, LevelId};
use super::progression::ProgressionError;
use super::store::KeyValueStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage key of the whole progress blob
pub const PROGRESS_NAMESPACE: &str = "eggPartyProgress";

/// Best result and unlock status of one level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub score: u32,
    pub stars: u8,
    pub unlocked: bool,
}

/// `{ "<levelId>": { "score": .., "stars": .., "unlocked": .. } }`
type ProgressBlob = BTreeMap<LevelId, ProgressRecord>;

/// Per-level progress persisted as one JSON blob in a key-value store
pub struct ProgressBook {
    store: Box<dyn KeyValueStore>,
}

impl ProgressBook {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the blob. Missing, unreadable or corrupt data counts as empty.
    fn read_blob(&self) -> ProgressBlob {
        let raw = match self.store.get(PROGRESS_NAMESPACE) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ProgressBlob::new(),
            Err(e) => {
                warn!("{}", e);
                return ProgressBlob::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Discarding corrupt progress data: {}", e);
            ProgressBlob::new()
        })
    }

    fn write_blob(&mut self, blob: &ProgressBlob) -> Result<(), ProgressionError> {
        let json = serde_json::to_string(blob)
            .map_err(|e| ProgressionError::PersistenceWriteFailure(e.to_string()))?;
        self.store.set(PROGRESS_NAMESPACE, &json)
    }

    pub fn load_progress(&self, id: &LevelId) -> Option<ProgressRecord> {
        self.read_blob().get(id).copied()
    }

    /// Overwrite the record of one level
    pub fn save_progress(
        &mut self,
        id: &LevelId,
        record: ProgressRecord,
    ) -> Result<(), ProgressionError> {
        let mut blob = self.read_blob();
        blob.insert(id.clone(), record);
        self.write_blob(&blob)
    }

    /// Store a finished run when it beats the best score. Returns whether it did.
    pub fn record_result(
        &mut self,
        id: &LevelId,
        score: u32,
        stars: u8,
    ) -> Result<bool, ProgressionError> {
        let mut blob = self.read_blob();
        if blob.get(id).is_some_and(|best| score <= best.score) {
            return Ok(false);
        }

        blob.insert(
            id.clone(),
            ProgressRecord {
                score,
                stars: stars.min(3),
                unlocked: true,
            },
        );
        self.write_blob(&blob)?;
        info!("Level {} progress saved: score={}, stars={}", id, score, stars);
        Ok(true)
    }

    /// Unlock a level once. Existing records are never rewritten.
    pub fn unlock(&mut self, id: &LevelId) -> Result<bool, ProgressionError> {
        let mut blob = self.read_blob();
        if blob.get(id).is_some_and(|record| record.unlocked) {
            return Ok(false);
        }

        let record = blob.entry(id.clone()).or_default();
        record.unlocked = true;
        self.write_blob(&blob)?;
        info!("Level {} unlocked", id);
        Ok(true)
    }

    /// The first level is always open
    pub fn is_unlocked(&self, catalog: &LevelCatalog, id: &LevelId) -> bool {
        catalog.is_first(id) || self.load_progress(id).is_some_and(|record| record.unlocked)
    }

    /// Unlocked levels in catalog order
    pub fn unlocked_levels(&self, catalog: &LevelCatalog) -> Vec<LevelId> {
        let blob = self.read_blob();
        catalog
            .ids()
            .filter(|id| catalog.is_first(id) || blob.get(*id).is_some_and(|r| r.unlocked))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::tests::test_catalog;
    use crate::game::store::tests::scratch_dir;
    use crate::game::store::{FileStore, MemoryStore};

    fn book() -> ProgressBook {
        ProgressBook::new(Box::new(MemoryStore::new()))
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, ProgressionError> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), ProgressionError> {
            Err(ProgressionError::PersistenceWriteFailure(key.to_string()))
        }
    }

    #[test]
    fn test_only_better_scores_are_kept() {
        let mut book = book();
        let id = LevelId::new("1-1");

        assert!(book.record_result(&id, 50, 1).unwrap());
        assert!(!book.record_result(&id, 40, 3).unwrap());
        assert!(!book.record_result(&id, 50, 3).unwrap());
        assert!(book.record_result(&id, 90, 2).unwrap());

        assert_eq!(
            book.load_progress(&id),
            Some(ProgressRecord {
                score: 90,
                stars: 2,
                unlocked: true
            })
        );
    }

    #[test]
    fn test_unlock_is_one_time() {
        let mut book = book();
        let id = LevelId::new("1-2");

        assert!(book.unlock(&id).unwrap());
        assert!(!book.unlock(&id).unwrap());
        assert_eq!(book.load_progress(&id), Some(ProgressRecord {
            score: 0,
            stars: 0,
            unlocked: true,
        }));
    }

    #[test]
    fn test_unlock_keeps_existing_best() {
        let mut book = book();
        let id = LevelId::new("1-2");
        book.record_result(&id, 70, 2).unwrap();

        assert!(!book.unlock(&id).unwrap());
        assert_eq!(book.load_progress(&id).unwrap().score, 70);
    }

    #[test]
    fn test_unlocked_levels() {
        let catalog = test_catalog();
        let mut book = book();

        assert_eq!(book.unlocked_levels(&catalog), vec![LevelId::new("1-1")]);
        assert!(!book.is_unlocked(&catalog, &LevelId::new("1-3")));

        book.unlock(&LevelId::new("1-3")).unwrap();

        assert_eq!(
            book.unlocked_levels(&catalog),
            vec![LevelId::new("1-1"), LevelId::new("1-3")]
        );
        assert!(book.is_unlocked(&catalog, &LevelId::new("1-3")));
    }

    #[test]
    fn test_blob_format() {
        let mut store = MemoryStore::new();
        store
            .set(
                PROGRESS_NAMESPACE,
                r#"{"1-1":{"score":120,"stars":3,"unlocked":true}}"#,
            )
            .unwrap();
        let mut book = ProgressBook::new(Box::new(store));

        assert_eq!(book.load_progress(&LevelId::new("1-1")).unwrap().score, 120);

        book.save_progress(&LevelId::new("1-2"), ProgressRecord::default())
            .unwrap();
        assert_eq!(book.load_progress(&LevelId::new("1-2")), Some(ProgressRecord::default()));
        assert_eq!(book.load_progress(&LevelId::new("1-1")).unwrap().stars, 3);
    }

    #[test]
    fn test_corrupt_blob_is_treated_as_empty() {
        let mut store = MemoryStore::new();
        store.set(PROGRESS_NAMESPACE, "{ definitely not json").unwrap();
        let mut book = ProgressBook::new(Box::new(store));

        assert_eq!(book.load_progress(&LevelId::new("1-1")), None);
        assert!(book.record_result(&LevelId::new("1-1"), 10, 1).unwrap());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut book = ProgressBook::new(Box::new(BrokenStore));

        let result = book.record_result(&LevelId::new("1-1"), 10, 1);

        assert!(matches!(
            result,
            Err(ProgressionError::PersistenceWriteFailure(_))
        ));
    }

    #[test]
    fn test_file_backed_book_persists() {
        let dir = scratch_dir("progress_book");
        let id = LevelId::new("1-1");

        let mut book = ProgressBook::new(Box::new(FileStore::new(&dir)));
        book.record_result(&id, 33, 2).unwrap();

        let reopened = ProgressBook::new(Box::new(FileStore::new(&dir)));
        assert_eq!(reopened.load_progress(&id).unwrap().score, 33);

        let _ = std::fs::remove_dir_all(dir);
    }
}
