//! Series cache collaborators.
//!
//! Assembling a station reads and projects every daily log; a cache lets a
//! later run skip that work. The assembler is handed a cache explicitly and
//! consults it before ingesting anything.
//!
//! Every cached series carries a [`CacheKey`] describing the daily logs and
//! ingestion settings it was built from; a cache whose key no longer matches
//! the station is treated as a miss.
//!
//! [`ParquetCache`] stores one row per slot:
//!
//! ```text
//! timestamp | day_label | day_measured | slot_measured | cache_key | speed_<h>... | direction_<h>...
//! ```

use crate::config::SodarConfig;
use crate::constants::{NO_DATA, SLOTS_PER_DAY};
use crate::error::{Result, SodarError};
use crate::models::{Band, DayEntry, DayOrigin, SodarTimestamp};
use crate::series::SodarCollection;
use ndarray::{Array3, s};
use polars::prelude::{Column, DataFrame, ParquetReader, ParquetWriter, SerReader};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const TIMESTAMP_COLUMN: &str = "timestamp";
const DAY_LABEL_COLUMN: &str = "day_label";
const DAY_MEASURED_COLUMN: &str = "day_measured";
const SLOT_MEASURED_COLUMN: &str = "slot_measured";
const CACHE_KEY_COLUMN: &str = "cache_key";

/// Identity of the inputs a series was assembled from
///
/// Built from the collision policy, the fallback year and the name and size
/// of every daily log, relative to the station directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(station_path: &Path, files: &[PathBuf], config: &SodarConfig) -> Result<Self> {
        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let name = file.strip_prefix(station_path).unwrap_or(file);
            let size = std::fs::metadata(file)?.len();
            entries.push(format!("{}:{}", name.display(), size));
        }
        Ok(Self(format!(
            "{:?};{};{}",
            config.collision_policy,
            config.fallback_year,
            entries.join(",")
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Load/save interface for assembled collections
pub trait SeriesCache {
    /// A previously saved collection built from `key`, or `None` on a miss
    fn load(&self, path: &Path, key: &CacheKey) -> Result<Option<SodarCollection>>;

    /// Persist a collection for later runs
    fn save(&self, path: &Path, key: &CacheKey, series: &SodarCollection) -> Result<()>;
}

/// Cache that never hits and never writes
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl SeriesCache for NoCache {
    fn load(&self, _path: &Path, _key: &CacheKey) -> Result<Option<SodarCollection>> {
        Ok(None)
    }

    fn save(&self, _path: &Path, _key: &CacheKey, _series: &SodarCollection) -> Result<()> {
        Ok(())
    }
}

/// Cache backed by a Parquet file
#[derive(Debug, Default, Clone, Copy)]
pub struct ParquetCache;

impl SeriesCache for ParquetCache {
    fn load(&self, path: &Path, key: &CacheKey) -> Result<Option<SodarCollection>> {
        if !path.is_file() {
            debug!("No cached series at {}", path.display());
            return Ok(None);
        }

        let file = File::open(path)?;
        let df = ParquetReader::new(file).finish()?;
        if stored_key(&df).as_deref() != Some(key.as_str()) {
            info!("Cached series at {} is stale; rebuilding", path.display());
            return Ok(None);
        }
        let series = frame_to_collection(&df, path)?;

        info!(
            "Loaded cached series {} from {} ({} days)",
            series.name(),
            path.display(),
            series.day_count()
        );
        Ok(Some(series))
    }

    fn save(&self, path: &Path, key: &CacheKey, series: &SodarCollection) -> Result<()> {
        let mut df = collection_to_frame(series, key)?;
        let file = File::create(path)?;
        ParquetWriter::new(file).finish(&mut df)?;

        info!(
            "Cached series {} to {} ({} slots)",
            series.name(),
            path.display(),
            series.slot_count()
        );
        Ok(())
    }
}

fn value_column_name(band: Band, height: i32) -> String {
    format!("{}_{}", band.name(), height)
}

/// Key the cached frame was written with, if it has one
fn stored_key(df: &DataFrame) -> Option<String> {
    let column = df.column(CACHE_KEY_COLUMN).ok()?;
    let keys = column.as_materialized_series().str().ok()?;
    keys.get(0).map(str::to_string)
}

fn collection_to_frame(series: &SodarCollection, key: &CacheKey) -> Result<DataFrame> {
    let timestamps: Vec<u64> = series.timestamps().iter().map(|t| t.raw()).collect();
    let mut day_labels = Vec::with_capacity(series.slot_count());
    let mut day_measured = Vec::with_capacity(series.slot_count());
    for day in series.days() {
        for _ in 0..SLOTS_PER_DAY {
            day_labels.push(day.label.clone());
            day_measured.push(day.is_measured());
        }
    }

    let mut columns = vec![
        Column::new(TIMESTAMP_COLUMN.into(), timestamps),
        Column::new(DAY_LABEL_COLUMN.into(), day_labels),
        Column::new(DAY_MEASURED_COLUMN.into(), day_measured),
        Column::new(SLOT_MEASURED_COLUMN.into(), series.measured_slots().to_vec()),
        Column::new(
            CACHE_KEY_COLUMN.into(),
            vec![key.as_str(); series.slot_count()],
        ),
    ];
    for band in Band::ALL {
        let band_data = series.band(band);
        for (h, height) in series.heights().iter().enumerate() {
            let values: Vec<f64> = band_data.column(h).to_vec();
            columns.push(Column::new(value_column_name(band, *height).into(), values));
        }
    }

    Ok(DataFrame::new(columns)?)
}

fn frame_to_collection(df: &DataFrame, path: &Path) -> Result<SodarCollection> {
    let corrupt = |reason: String| SodarError::cache(path, reason);

    let timestamps = df
        .column(TIMESTAMP_COLUMN)?
        .as_materialized_series()
        .u64()?
        .into_iter()
        .map(|raw| {
            raw.ok_or_else(|| corrupt("null timestamp".to_string()))
                .and_then(SodarTimestamp::from_raw)
        })
        .collect::<Result<Vec<_>>>()?;
    let labels: Vec<Option<&str>> = df
        .column(DAY_LABEL_COLUMN)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .collect();
    let day_measured: Vec<bool> = df
        .column(DAY_MEASURED_COLUMN)?
        .as_materialized_series()
        .bool()?
        .into_iter()
        .map(|v| v.unwrap_or(false))
        .collect();
    let measured: Vec<bool> = df
        .column(SLOT_MEASURED_COLUMN)?
        .as_materialized_series()
        .bool()?
        .into_iter()
        .map(|v| v.unwrap_or(false))
        .collect();

    if timestamps.is_empty() || timestamps.len() % SLOTS_PER_DAY != 0 {
        return Err(corrupt(format!(
            "{} slots is not a whole number of days",
            timestamps.len()
        )));
    }

    let prefix = format!("{}_", Band::Speed.name());
    let heights = df
        .get_column_names()
        .iter()
        .filter_map(|name| name.as_str().strip_prefix(prefix.as_str()))
        .map(|height| {
            height
                .parse::<i32>()
                .map_err(|e| corrupt(format!("bad height column '{}': {}", height, e)))
        })
        .collect::<Result<Vec<i32>>>()?;

    let mut dataset = Array3::from_elem((Band::ALL.len(), timestamps.len(), heights.len()), NO_DATA);
    for band in Band::ALL {
        for (h, height) in heights.iter().enumerate() {
            let values = df
                .column(&value_column_name(band, *height))?
                .as_materialized_series()
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(NO_DATA))
                .collect::<Vec<f64>>();
            let mut column = dataset.slice_mut(s![band.index(), .., h]);
            for (cell, value) in column.iter_mut().zip(values) {
                *cell = value;
            }
        }
    }

    let mut days = Vec::with_capacity(timestamps.len() / SLOTS_PER_DAY);
    for first_slot in (0..timestamps.len()).step_by(SLOTS_PER_DAY) {
        let label = labels[first_slot]
            .ok_or_else(|| corrupt(format!("missing day label at slot {}", first_slot)))?;
        days.push(DayEntry {
            label: label.to_string(),
            date: timestamps[first_slot].date()?,
            origin: if day_measured[first_slot] {
                DayOrigin::Measured
            } else {
                DayOrigin::Placeholder
            },
        });
    }

    let name = path
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    SodarCollection::from_parts(name, days, Arc::new(heights), dataset, timestamps, measured)
}
