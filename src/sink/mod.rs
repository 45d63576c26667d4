//! Persistence sinks for finalized places.
//!
//! A sink buffers everything it is given and makes it visible in a single
//! step at `commit`. A run that fails before commit leaves nothing behind.

mod csv_sink;
mod sled_sink;

use std::path::PathBuf;

use crate::models::ExportedPlace;

pub use csv_sink::CsvSink;
pub use sled_sink::SledSink;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub trait PlaceSink {
    /// Stage one place. Nothing is visible until `commit`.
    fn write(&mut self, place: &ExportedPlace) -> Result<(), SinkError>;

    /// Publish everything staged; returns the number of places committed.
    fn commit(self: Box<Self>) -> Result<usize, SinkError>;
}
