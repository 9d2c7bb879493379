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
    pub users: sled::Tree,
    pub classrooms: sled::Tree,
    pub classroom_units: sled::Tree,
    pub classroom_subunits: sled::Tree,
    pub classroom_contents: sled::Tree,
    pub metric_events: sled::Tree,
    pub config_versions: sled::Tree,
    // Secondary index trees
    pub units_by_classroom: sled::Tree,
    pub subunits_by_unit: sled::Tree,
    pub contents_by_subunit: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let users = db.open_tree(trees::USERS)?;
        let classrooms = db.open_tree(trees::CLASSROOMS)?;
        let classroom_units = db.open_tree(trees::CLASSROOM_UNITS)?;
        let classroom_subunits = db.open_tree(trees::CLASSROOM_SUBUNITS)?;
        let classroom_contents = db.open_tree(trees::CLASSROOM_CONTENTS)?;
        let metric_events = db.open_tree(trees::METRIC_EVENTS)?;
        let config_versions = db.open_tree(trees::CONFIG_VERSIONS)?;
        // Secondary index trees
        let units_by_classroom = db.open_tree(trees::UNITS_BY_CLASSROOM)?;
        let subunits_by_unit = db.open_tree(trees::SUBUNITS_BY_UNIT)?;
        let contents_by_subunit = db.open_tree(trees::CONTENTS_BY_SUBUNIT)?;

        Ok(Self {
            db,
            users,
            classrooms,
            classroom_units,
            classroom_subunits,
            classroom_contents,
            metric_events,
            config_versions,
            units_by_classroom,
            subunits_by_unit,
            contents_by_subunit,
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

    /// Loads the primary records referenced by an index tree prefix scan.
    /// Index entries whose primary record has gone missing are skipped.
    pub(crate) fn load_indexed<T: DeserializeOwned>(
        &self,
        index: &sled::Tree,
        prefix: &str,
        primary: &sled::Tree,
    ) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        for item in index.scan_prefix(prefix.as_bytes()) {
            let (_, id) = item?;
            match primary.get(&id)? {
                Some(raw) => out.push(Self::deserialize(&raw)?),
                None => {
                    tracing::warn!(
                        id = %String::from_utf8_lossy(&id),
                        "Dangling index entry, skipping"
                    );
                }
            }
        }
        Ok(out)
    }
}
