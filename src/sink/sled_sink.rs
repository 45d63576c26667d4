use std::path::Path;

use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use serde::Serialize;
use sled::{Batch, Db, Tree};
use tracing::{debug, info};

use super::{PlaceSink, SinkError};
use crate::models::ExportedPlace;

const TREE_NAME: &str = "places";
const FEATURE_PREFIX: &str = "feature/";
const NAME_PREFIX: &str = "name/";

#[derive(Debug, Serialize)]
struct ImportMeta {
    imported_at: DateTime<Utc>,
    places: usize,
}

/// Stores features and names in one sled tree, applied as a single batch.
///
/// Keys: `feature/<id>`, `name/<id>`, and `meta/last_import`.
///
/// A commit replaces the previous import: feature and name keys this run
/// did not write are removed in the same batch.
pub struct SledSink {
    db: Db,
    tree: Tree,
    batch: Batch,
    written: HashSet<String>,
    staged: usize,
}

impl SledSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        info!("Opening sled database at {}", path.as_ref().display());
        Self::from_db(sled::open(path)?)
    }

    pub fn from_db(db: Db) -> Result<Self, SinkError> {
        let tree = db.open_tree(TREE_NAME)?;
        Ok(Self {
            db,
            tree,
            batch: Batch::default(),
            written: HashSet::new(),
            staged: 0,
        })
    }

    pub fn feature_key(feature_id: i64) -> String {
        format!("{}{:020}", FEATURE_PREFIX, feature_id)
    }

    pub fn name_key(name_id: i64) -> String {
        format!("{}{:020}", NAME_PREFIX, name_id)
    }

    /// Queue removal of every place key from an earlier import that this
    /// run did not write. Returns how many were queued.
    fn remove_stale(
        tree: &Tree,
        written: &HashSet<String>,
        batch: &mut Batch,
    ) -> Result<usize, SinkError> {
        let mut removed = 0;
        for prefix in [FEATURE_PREFIX, NAME_PREFIX] {
            for key in tree.scan_prefix(prefix).keys() {
                let key = key?;
                let stale = std::str::from_utf8(&key).map_or(true, |k| !written.contains(k));
                if stale {
                    batch.remove(key);
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

impl PlaceSink for SledSink {
    fn write(&mut self, place: &ExportedPlace) -> Result<(), SinkError> {
        let feature = serde_json::to_vec(&place.feature)?;
        let name = serde_json::to_vec(&place.name)?;

        let feature_key = Self::feature_key(place.feature.feature_id);
        let name_key = Self::name_key(place.name.name_id);
        self.batch.insert(feature_key.as_bytes(), feature);
        self.batch.insert(name_key.as_bytes(), name);
        self.written.insert(feature_key);
        self.written.insert(name_key);
        self.staged += 1;
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<usize, SinkError> {
        let SledSink {
            db,
            tree,
            mut batch,
            written,
            staged,
        } = *self;

        let removed = Self::remove_stale(&tree, &written, &mut batch)?;
        if removed > 0 {
            debug!("Removing {} keys from the previous import", removed);
        }

        let meta = ImportMeta {
            imported_at: Utc::now(),
            places: staged,
        };
        batch.insert("meta/last_import".as_bytes(), serde_json::to_vec(&meta)?);

        tree.apply_batch(batch)?;
        db.flush()?;

        Ok(staged)
    }
}
