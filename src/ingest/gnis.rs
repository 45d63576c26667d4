//! Reader for pipe-delimited gazetteer extracts (GNIS national file layout).

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use indicatif::ProgressBar;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use gazetteer::models::{AdminUnit, GeoPoint, PlaceRecord};
use gazetteer::store::RecordStore;

const POPULATED_PLACE: &str = "Populated Place";

/// Only the first few malformed rows are logged individually
const MALFORMED_LOG_LIMIT: usize = 10;

//schema (first columns)

//FEATURE_ID|FEATURE_NAME|FEATURE_CLASS|STATE_ALPHA|STATE_NUMERIC|COUNTY_NAME|COUNTY_NUMERIC|PRIMARY_LAT_DMS|PRIM_LONG_DMS|PRIM_LAT_DEC|PRIM_LONG_DEC|...
//479|Abbeville|Populated Place|AL|01|Henry|067|313418N|0851502W|31.5715568|-85.2504943|...

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    pub rows: usize,
    pub kept: usize,
    pub skipped_class: usize,
    pub skipped_coords: usize,
    pub duplicates: usize,
    pub malformed: usize,
}

struct Columns {
    id: usize,
    name: usize,
    class: usize,
    state: usize,
    county: usize,
    lat: usize,
    lon: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .with_context(|| format!("Column '{}' not found", name))
        };

        Ok(Self {
            id: find("FEATURE_ID")?,
            name: find("FEATURE_NAME")?,
            class: find("FEATURE_CLASS")?,
            state: find("STATE_ALPHA")?,
            county: find("COUNTY_NAME")?,
            lat: find("PRIM_LAT_DEC")?,
            lon: find("PRIM_LONG_DEC")?,
        })
    }
}

enum Row {
    Place(PlaceRecord),
    OtherClass,
    NoCoordinates,
    Malformed(String),
}

pub struct ExtractReader {
    marker: Regex,
}

impl ExtractReader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            marker: Regex::new(r"(?i)\s*\((historical|subdivision)\)\s*$")?,
        })
    }

    /// Read an extract from disk, transparently decompressing `.gz` files
    pub fn read_file(&self, path: &Path, progress: &ProgressBar) -> Result<(RecordStore, ReadStats)> {
        info!("Reading extract from {}", path.display());

        let file = File::open(path).context("Failed to open extract file")?;
        let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        self.read(reader, progress)
    }

    pub fn read<R: Read>(&self, reader: R, progress: &ProgressBar) -> Result<(RecordStore, ReadStats)> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b'|')
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let columns = Columns::from_headers(csv_reader.headers()?)?;

        let mut store = RecordStore::new();
        let mut stats = ReadStats::default();

        for result in csv_reader.records() {
            progress.inc(1);
            stats.rows += 1;

            let row = match result {
                Ok(record) => self.parse_row(&record, &columns),
                Err(e) => Row::Malformed(e.to_string()),
            };

            match row {
                Row::Place(place) => {
                    if store.insert(place) {
                        stats.kept += 1;
                    } else {
                        stats.duplicates += 1;
                    }
                }
                Row::OtherClass => stats.skipped_class += 1,
                Row::NoCoordinates => stats.skipped_coords += 1,
                Row::Malformed(reason) => {
                    stats.malformed += 1;
                    if stats.malformed <= MALFORMED_LOG_LIMIT {
                        warn!("Skipping malformed row {}: {}", stats.rows, reason);
                    }
                }
            }
        }

        info!(
            "Read {} rows: {} places kept, {} other classes, {} without coordinates, {} duplicates, {} malformed",
            stats.rows,
            stats.kept,
            stats.skipped_class,
            stats.skipped_coords,
            stats.duplicates,
            stats.malformed
        );

        Ok((store, stats))
    }

    fn parse_row(&self, record: &StringRecord, columns: &Columns) -> Row {
        let field = |idx: usize| record.get(idx).map(str::trim);

        match field(columns.class) {
            Some(POPULATED_PLACE) => {}
            Some(_) => return Row::OtherClass,
            None => return Row::Malformed("missing FEATURE_CLASS".to_string()),
        }

        let id = match field(columns.id).map(str::parse::<i64>) {
            Some(Ok(id)) => id,
            _ => return Row::Malformed("bad FEATURE_ID".to_string()),
        };

        let name = match field(columns.name) {
            Some(name) if !name.is_empty() => self.clean_name(name),
            _ => return Row::Malformed(format!("place {} has no name", id)),
        };

        let (Some(state), Some(county)) = (field(columns.state), field(columns.county)) else {
            return Row::Malformed(format!("place {} has no admin unit", id));
        };

        let lat = field(columns.lat).and_then(|v| v.parse::<f64>().ok());
        let lon = field(columns.lon).and_then(|v| v.parse::<f64>().ok());
        let location = match (lat, lon) {
            // 0/0 marks an unknown location in the source
            (Some(lat), Some(lon))
                if !(lat == 0.0 && lon == 0.0)
                    && (-90.0..=90.0).contains(&lat)
                    && (-180.0..=180.0).contains(&lon) =>
            {
                GeoPoint::new(lat, lon)
            }
            _ => return Row::NoCoordinates,
        };

        Row::Place(PlaceRecord::new(
            id,
            name,
            AdminUnit::new(state, county),
            location,
        ))
    }

    /// Strip trailing "(historical)" and "(subdivision)" markers
    pub fn clean_name(&self, name: &str) -> String {
        self.marker.replace(name, "").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "FEATURE_ID|FEATURE_NAME|FEATURE_CLASS|STATE_ALPHA|STATE_NUMERIC|COUNTY_NAME|COUNTY_NUMERIC|PRIMARY_LAT_DMS|PRIM_LONG_DMS|PRIM_LAT_DEC|PRIM_LONG_DEC";

    fn read(body: &str) -> (RecordStore, ReadStats) {
        let input = format!("{}\n{}", HEADER, body);
        ExtractReader::new()
            .unwrap()
            .read(input.as_bytes(), &ProgressBar::hidden())
            .unwrap()
    }

    #[test]
    fn test_reads_populated_places() {
        let (store, stats) = read(
            "479|Abbeville|Populated Place|AL|01|Henry|067|313418N|0851502W|31.5715568|-85.2504943\n\
             480|Abbeville Creek|Stream|AL|01|Henry|067|313418N|0851502W|31.57|-85.25\n",
        );

        assert_eq!(stats.rows, 2);
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.skipped_class, 1);

        let place = store.get(479).unwrap();
        assert_eq!(place.name, "Abbeville");
        assert_eq!(place.unit, AdminUnit::new("AL", "Henry"));
        assert_eq!(place.location, GeoPoint::new(31.5715568, -85.2504943));
    }

    #[test]
    fn test_drops_unknown_coordinates() {
        let (store, stats) = read(
            "1|Nowhere|Populated Place|TX|48|Kent|263|||0|0\n\
             2|Elsewhere|Populated Place|TX|48|Kent|263||||\n\
             3|Offworld|Populated Place|TX|48|Kent|263|||95.0|-100.0\n",
        );

        assert!(store.is_empty());
        assert_eq!(stats.skipped_coords, 3);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let (store, stats) = read(
            "abc|Broken|Populated Place|TX|48|Kent|263|||33.1|-100.8\n\
             5|Short|Populated Place\n\
             6|Jayton|Populated Place|TX|48|Kent|263|||33.25|-100.57\n",
        );

        assert_eq!(stats.malformed, 2);
        assert_eq!(stats.kept, 1);
        assert!(store.get(6).is_some());
    }

    #[test]
    fn test_duplicate_ids_counted() {
        let (store, stats) = read(
            "6|Jayton|Populated Place|TX|48|Kent|263|||33.25|-100.57\n\
             6|Jayton|Populated Place|TX|48|Kent|263|||33.25|-100.57\n",
        );

        assert_eq!(store.len(), 1);
        assert_eq!(stats.duplicates, 1);
    }

    #[test]
    fn test_clean_name() {
        let reader = ExtractReader::new().unwrap();
        assert_eq!(reader.clean_name("Oak Hill (historical)"), "Oak Hill");
        assert_eq!(reader.clean_name("Deer Run (Subdivision)"), "Deer Run");
        assert_eq!(reader.clean_name("Fort Hill"), "Fort Hill");
        assert_eq!(reader.clean_name("Quote's \"Place\""), "Quote's \"Place\"");
    }
}
