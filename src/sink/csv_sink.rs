use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use csv::Writer;
use tempfile::{NamedTempFile, TempPath};
use tracing::{info, warn};

use super::{PlaceSink, SinkError};
use crate::models::ExportedPlace;

pub const FEATURES_FILE: &str = "features.csv";
pub const NAMES_FILE: &str = "names.csv";

/// Writes `features.csv` and `names.csv` into a directory.
///
/// Rows go to temp files in the same directory; `commit` renames them into
/// place. If the second rename fails the first is undone, so a failed commit
/// leaves whatever the directory held before.
pub struct CsvSink {
    dir: PathBuf,
    features: Writer<NamedTempFile>,
    names: Writer<NamedTempFile>,
    staged: usize,
}

impl CsvSink {
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, SinkError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Writing CSV output to {}", dir.display());

        Ok(Self {
            features: Writer::from_writer(NamedTempFile::new_in(&dir)?),
            names: Writer::from_writer(NamedTempFile::new_in(&dir)?),
            dir,
            staged: 0,
        })
    }

    fn finish(mut writer: Writer<NamedTempFile>) -> Result<NamedTempFile, SinkError> {
        writer.flush()?;
        let mut file = writer
            .into_inner()
            .map_err(|e| SinkError::Io(io::Error::new(e.error().kind(), e.error().to_string())))?;
        file.flush()?;
        file.as_file().sync_all()?;
        Ok(file)
    }

    fn persist(file: NamedTempFile, path: &Path) -> Result<(), SinkError> {
        file.persist(path).map_err(|e| SinkError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }

    /// Move an existing file out of the way, returning where it went
    fn set_aside(dir: &Path, path: &Path) -> Result<Option<TempPath>, SinkError> {
        if !path.is_file() {
            return Ok(None);
        }
        let backup = NamedTempFile::new_in(dir)?.into_temp_path();
        fs::rename(path, &backup)?;
        Ok(Some(backup))
    }

    fn roll_back(path: &Path, previous: Option<TempPath>) {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", path.display(), e),
        }
        if let Some(backup) = previous {
            if let Err(e) = backup.persist(path) {
                warn!("Could not restore previous {}: {}", path.display(), e.error);
            }
        }
    }
}

impl PlaceSink for CsvSink {
    fn write(&mut self, place: &ExportedPlace) -> Result<(), SinkError> {
        self.features.serialize(&place.feature)?;
        self.names.serialize(&place.name)?;
        self.staged += 1;
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<usize, SinkError> {
        let CsvSink {
            dir,
            features,
            names,
            staged,
        } = *self;

        let features = Self::finish(features)?;
        let names = Self::finish(names)?;

        let features_path = dir.join(FEATURES_FILE);
        let previous = Self::set_aside(&dir, &features_path)?;

        let published = Self::persist(features, &features_path)
            .and_then(|()| Self::persist(names, &dir.join(NAMES_FILE)));
        if let Err(e) = published {
            Self::roll_back(&features_path, previous);
            return Err(e);
        }

        Ok(staged)
    }
}
