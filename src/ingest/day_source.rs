//! Fixed-shape day arrays.
//!
//! A [`DaySource`] holds one calendar day as a dense
//! (bands × 288 slots × heights) array. Records are projected into their
//! slot by time of day, so the slot axis is complete no matter how many
//! records the log actually contained.

use crate::config::{CollisionPolicy, SodarConfig};
use crate::constants::{NO_DATA, SLOTS_PER_DAY};
use crate::error::{Result, SodarError};
use crate::ingest::parser::{ParsedDay, parse_sdr_file};
use crate::models::{Band, DayEntry, DayOrigin, SodarTimestamp};
use chrono::{Datelike, NaiveDate};
use ndarray::{Array3, ArrayView2, Axis};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// One day of a station, measured or synthesized
#[derive(Debug, Clone)]
pub struct DaySource {
    pub(crate) label: String,
    pub(crate) date: NaiveDate,
    pub(crate) origin: DayOrigin,
    pub(crate) heights: Arc<Vec<i32>>,
    pub(crate) data: Array3<f64>,
    pub(crate) timestamps: Vec<SodarTimestamp>,
    pub(crate) measured: Vec<bool>,
    pub(crate) collisions: usize,
}

impl DaySource {
    /// Read a daily log and build its day array
    pub fn from_file(path: &Path, config: &SodarConfig) -> Result<Self> {
        let label = file_label(path)?;
        let parsed = parse_sdr_file(path)?;
        Self::from_parsed(label, parsed, config.collision_policy, config.fallback_year)
    }

    /// Build a day array from parsed records
    ///
    /// The day's date comes from its first record, or from the MMDD label and
    /// `fallback_year` when the log holds no records. A first record dated
    /// away from the label is logged as a warning. When fewer than every
    /// slot received a record, all slot timestamps are regenerated from that
    /// date so the day always presents a complete, calendar-correct axis.
    pub fn from_parsed(
        label: impl Into<String>,
        parsed: ParsedDay,
        policy: CollisionPolicy,
        fallback_year: i32,
    ) -> Result<Self> {
        let label = label.into();
        let date = match parsed.timestamps.first() {
            Some(first) => {
                let date = first.date()?;
                if let Some(label_date) = label_date_mismatch(&label, date) {
                    warn!(
                        "Day {}: first record is dated {} but the file name gives {}",
                        label, date, label_date
                    );
                }
                date
            }
            None => label_to_date(&label, fallback_year).ok_or_else(|| {
                SodarError::InvalidFileName {
                    path: label.clone().into(),
                }
            })?,
        };

        let height_count = parsed.heights.len();
        let mut data = Array3::from_elem((Band::ALL.len(), SLOTS_PER_DAY, height_count), NO_DATA);
        let mut slot_timestamps: Vec<Option<SodarTimestamp>> = vec![None; SLOTS_PER_DAY];
        let mut collisions = 0;

        let records = parsed
            .timestamps
            .iter()
            .zip(parsed.speeds.iter().zip(parsed.directions.iter()));
        for (timestamp, (speeds, directions)) in records {
            let slot = timestamp.slot_index();
            if slot_timestamps[slot].is_some() {
                collisions += 1;
                if !policy.replaces_existing() {
                    continue;
                }
            }
            slot_timestamps[slot] = Some(*timestamp);
            for (band, values) in [(Band::Speed, speeds), (Band::Direction, directions)] {
                for (height, value) in values.iter().enumerate().take(height_count) {
                    data[[band.index(), slot, height]] = *value;
                }
            }
        }

        let measured: Vec<bool> = slot_timestamps.iter().map(Option::is_some).collect();
        let measured_count = measured.iter().filter(|m| **m).count();
        let timestamps = if measured_count < SLOTS_PER_DAY {
            (0..SLOTS_PER_DAY)
                .map(|slot| SodarTimestamp::for_slot(date, slot))
                .collect()
        } else {
            slot_timestamps.into_iter().flatten().collect()
        };

        if collisions > 0 {
            debug!(
                "Day {}: {} slot collisions resolved with {:?}",
                label, collisions, policy
            );
        }
        debug!(
            "Day {} ({}): {} of {} slots measured",
            label, date, measured_count, SLOTS_PER_DAY
        );

        Ok(Self {
            label,
            date,
            origin: DayOrigin::Measured,
            heights: Arc::new(parsed.heights),
            data,
            timestamps,
            measured,
            collisions,
        })
    }

    /// MMDD label of the day
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn origin(&self) -> DayOrigin {
        self.origin
    }

    pub fn is_measured(&self) -> bool {
        self.origin == DayOrigin::Measured
    }

    pub fn heights(&self) -> &Arc<Vec<i32>> {
        &self.heights
    }

    /// Full (bands × slots × heights) array
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// (slots × heights) view of one band
    pub fn band(&self, band: Band) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), band.index())
    }

    /// Canonical timestamp of every slot
    pub fn timestamps(&self) -> &[SodarTimestamp] {
        &self.timestamps
    }

    pub fn slot_count(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Per-slot provenance: true where a record was read, false where synthesized
    pub fn measured_slots(&self) -> &[bool] {
        &self.measured
    }

    /// Number of records that landed on an already occupied slot
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn entry(&self) -> DayEntry {
        DayEntry {
            label: self.label.clone(),
            date: self.date,
            origin: self.origin,
        }
    }
}

/// Label of a daily log, its file stem
pub fn file_label(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| SodarError::InvalidFileName {
            path: path.to_path_buf(),
        })
}

/// Decode the MMDD prefix of a label into a date of the given year
pub fn label_to_date(label: &str, year: i32) -> Option<NaiveDate> {
    let month = label.get(0..2)?.parse().ok()?;
    let day = label.get(2..4)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The label's date when it names a different day than `date`
///
/// Labels without an MMDD prefix are not compared.
pub fn label_date_mismatch(label: &str, date: NaiveDate) -> Option<NaiveDate> {
    label_to_date(label, date.year()).filter(|label_date| *label_date != date)
}
