//! State abbreviation lookup, consulted only when rendering exports.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use hashbrown::HashMap;
use serde::Deserialize;
use tracing::info;

/// Built-in table embedded at compile time
const BUILTIN_STATES: &str = include_str!("../data/states.csv");

#[derive(Debug, Deserialize)]
struct StateRow {
    abbr: String,
    name: String,
}

#[derive(Debug, Clone, Default)]
pub struct StateTable {
    /// Keyed by upper-case abbreviation
    names: HashMap<String, String>,
}

impl StateTable {
    /// US states, DC and inhabited territories
    pub fn builtin() -> Result<Self> {
        Self::from_reader(BUILTIN_STATES.as_bytes()).context("Failed to parse built-in state table")
    }

    /// Load an `abbr,name` CSV with a header row
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading state table from {}", path.display());

        let file = File::open(path).context("Failed to open state table")?;
        let table = Self::from_reader(file).context("Failed to parse state table")?;

        info!("Loaded {} states", table.len());
        Ok(table)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut names = HashMap::new();
        for row in csv_reader.deserialize() {
            let row: StateRow = row?;
            names.insert(row.abbr.to_ascii_uppercase(), row.name);
        }

        Ok(Self { names })
    }

    /// Full name for an abbreviation (case-insensitive)
    pub fn full_name(&self, abbr: &str) -> Option<&str> {
        self.names
            .get(abbr.trim().to_ascii_uppercase().as_str())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
