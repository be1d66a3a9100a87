pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub meta: sled::Tree,
    pub phases: sled::Tree,
    pub phase_timelines: sled::Tree,
    pub users: sled::Tree,
    pub daily_goals: sled::Tree,
    pub daily_reflections: sled::Tree,
    pub house_stats: sled::Tree,
    // Secondary index trees
    pub users_by_house: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let meta = db.open_tree(trees::META)?;
        let phases = db.open_tree(trees::PHASES)?;
        let phase_timelines = db.open_tree(trees::PHASE_TIMELINES)?;
        let users = db.open_tree(trees::USERS)?;
        let daily_goals = db.open_tree(trees::DAILY_GOALS)?;
        let daily_reflections = db.open_tree(trees::DAILY_REFLECTIONS)?;
        let house_stats = db.open_tree(trees::HOUSE_STATS)?;
        let users_by_house = db.open_tree(trees::USERS_BY_HOUSE)?;

        Ok(Self {
            db,
            meta,
            phases,
            phase_timelines,
            users,
            daily_goals,
            daily_reflections,
            house_stats,
            users_by_house,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Deserializes every value under `prefix`, in key order.
    pub(crate) fn scan_prefix_values<T: DeserializeOwned>(
        tree: &sled::Tree,
        prefix: &str,
    ) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            out.push(Self::deserialize(&value)?);
        }
        Ok(out)
    }

    pub(crate) fn all_values<T: DeserializeOwned>(
        tree: &sled::Tree,
    ) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        for item in tree.iter() {
            let (_, value) = item?;
            out.push(Self::deserialize(&value)?);
        }
        Ok(out)
    }
}
