//! Progress save/load
//!
//! The snapshot is a small versionless JSON document. A missing, malformed or
//! slow snapshot is never fatal: callers fall back to a new-game snapshot.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_LEVEL;
use crate::error::StoreError;
use crate::sim::Session;

/// Persisted progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub current_level: u32,
    pub total_currency: u64,
    pub score: u64,
    pub highest_unlocked_level: u32,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            current_level: 1,
            total_currency: 0,
            score: 0,
            highest_unlocked_level: 1,
        }
    }
}

impl ProgressSnapshot {
    pub fn from_session(session: &Session) -> Self {
        Self {
            current_level: session.current_level,
            total_currency: session.total_currency,
            score: session.score,
            highest_unlocked_level: session.highest_unlocked_level,
        }
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot, rejecting level numbers outside `1..=MAX_LEVEL`
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let snapshot: ProgressSnapshot = serde_json::from_str(json)?;
        let playable = 1..=MAX_LEVEL;
        if !playable.contains(&snapshot.current_level)
            || !playable.contains(&snapshot.highest_unlocked_level)
        {
            return Err(StoreError::Unavailable(format!(
                "snapshot level {} (unlocked {}) out of range",
                snapshot.current_level, snapshot.highest_unlocked_level
            )));
        }
        Ok(snapshot)
    }
}

/// Persistence collaborator
#[async_trait(?Send)]
pub trait ProgressStore {
    async fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError>;

    /// `Ok(None)` when nothing has been saved yet
    async fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError>;
}

/// Save with a deadline; expiry is reported as `StoreError::TimedOut`
pub async fn save_within(
    store: &mut dyn ProgressStore,
    snapshot: &ProgressSnapshot,
    limit: Duration,
) -> Result<(), StoreError> {
    match tokio::time::timeout(limit, store.save(snapshot)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::TimedOut(limit)),
    }
}

/// Load with a deadline, falling back to a new game on absence or any failure
pub async fn load_or_default(store: &mut dyn ProgressStore, limit: Duration) -> ProgressSnapshot {
    let loaded = match tokio::time::timeout(limit, store.load()).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::TimedOut(limit)),
    };
    match loaded {
        Ok(Some(snapshot)) => {
            log::info!(
                "Loaded progress: level {}, unlocked {}",
                snapshot.current_level,
                snapshot.highest_unlocked_level
            );
            snapshot
        }
        Ok(None) => {
            log::info!("No saved progress found, starting fresh");
            ProgressSnapshot::default()
        }
        Err(e) => {
            log::warn!("Failed to load progress, starting fresh: {}", e);
            ProgressSnapshot::default()
        }
    }
}

/// In-memory store; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw JSON (may be malformed)
    pub fn with_raw(json: impl Into<String>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(json.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ProgressStore for MemoryStore {
    async fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        *self.slot.borrow_mut() = Some(snapshot.to_json()?);
        Ok(())
    }

    async fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError> {
        match self.slot.borrow().as_deref() {
            Some(json) => ProgressSnapshot::from_json(json).map(Some),
            None => Ok(None),
        }
    }
}

/// JSON file store; writes go to a temp file then rename over the target
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait(?Send)]
impl ProgressStore for JsonFileStore {
    async fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        log::debug!("Progress saved to {}", self.path.display());
        Ok(())
    }

    async fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => ProgressSnapshot::from_json(&json).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(5);

    fn sample() -> ProgressSnapshot {
        ProgressSnapshot {
            current_level: 7,
            total_currency: 350,
            score: 12_840,
            highest_unlocked_level: 7,
        }
    }

    /// Never answers
    struct StalledStore;

    #[async_trait(?Send)]
    impl ProgressStore for StalledStore {
        async fn save(&mut self, _: &ProgressSnapshot) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load().await.unwrap(), None);
        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(sample()));
    }

    #[test]
    fn test_schema_field_names() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"currentLevel\":7"));
        assert!(json.contains("\"totalCurrency\":350"));
        assert!(json.contains("\"highestUnlockedLevel\":7"));
    }

    #[tokio::test]
    async fn test_malformed_snapshot_falls_back() {
        let mut store = MemoryStore::with_raw("{ not json");
        assert!(store.load().await.is_err());
        assert_eq!(load_or_default(&mut store, LIMIT).await, ProgressSnapshot::default());

        let mut zero = MemoryStore::with_raw(
            r#"{"currentLevel":0,"totalCurrency":0,"score":0,"highestUnlockedLevel":1}"#,
        );
        assert_eq!(load_or_default(&mut zero, LIMIT).await, ProgressSnapshot::default());
    }

    #[test]
    fn test_out_of_range_level_rejected() {
        let huge = r#"{"currentLevel":3000000000,"totalCurrency":0,"score":0,"highestUnlockedLevel":3000000000}"#;
        assert!(matches!(
            ProgressSnapshot::from_json(huge),
            Err(StoreError::Unavailable(_))
        ));

        let past_end = ProgressSnapshot {
            current_level: MAX_LEVEL,
            highest_unlocked_level: MAX_LEVEL + 1,
            ..sample()
        };
        assert!(ProgressSnapshot::from_json(&past_end.to_json().unwrap()).is_err());

        let last = ProgressSnapshot {
            current_level: MAX_LEVEL,
            highest_unlocked_level: MAX_LEVEL,
            ..sample()
        };
        assert_eq!(ProgressSnapshot::from_json(&last.to_json().unwrap()).unwrap(), last);
    }

    #[tokio::test]
    async fn test_stalled_store_times_out() {
        let limit = Duration::from_millis(20);
        let mut store = StalledStore;
        assert!(matches!(
            save_within(&mut store, &sample(), limit).await,
            Err(StoreError::TimedOut(_))
        ));
        assert_eq!(load_or_default(&mut store, limit).await, ProgressSnapshot::default());
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("progress.json"));
        assert_eq!(store.load().await.unwrap(), None);
        store.save(&sample()).await.unwrap();

        let mut reopened = JsonFileStore::new(dir.path().join("progress.json"));
        assert_eq!(reopened.load().await.unwrap(), Some(sample()));
    }
}
