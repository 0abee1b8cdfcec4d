//! The assembled multi-day series of one station.
//!
//! Days are laid end to end along the slot axis. Calendar gaps between
//! measured days are filled with placeholder days, and the whole axis must
//! advance by exactly one sampling interval from slot to slot.

use crate::constants::{NIGHT_START_SLOT, NIGHT_STOP_SLOT, NO_DATA, SAMPLE_INTERVAL_MINUTES, SLOTS_PER_DAY};
use crate::error::{Result, SodarError};
use crate::ingest::DaySource;
use crate::models::{Band, DayEntry, NightDescriptor, SodarTimestamp};
use chrono::{Duration, NaiveDateTime};
use ndarray::{Array3, ArrayView2, Axis, s};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A station's days assembled into one gapless, calendar ordered axis
#[derive(Debug, Clone)]
pub struct SodarCollection {
    name: String,
    days: Vec<DayEntry>,
    heights: Arc<Vec<i32>>,
    dataset: Array3<f64>,
    timestamps: Vec<SodarTimestamp>,
    measured: Vec<bool>,
    night_index: Vec<NightDescriptor>,
}

impl SodarCollection {
    /// Assemble measured days, given in ascending date order
    ///
    /// One placeholder is inserted for every missing date between two
    /// consecutive sources, so the result holds exactly one day per calendar
    /// date from the first to the last source.
    pub fn from_sources(name: impl Into<String>, sources: Vec<DaySource>) -> Result<Self> {
        let name = name.into();
        let sources = fill_calendar_gaps(&name, sources)?;

        let heights = Arc::clone(sources[0].heights());
        let reference = sources[0].label().to_string();
        for source in &sources {
            if source.heights().as_slice() != heights.as_slice() {
                return Err(SodarError::HeightMismatch {
                    label: source.label().to_string(),
                    reference,
                });
            }
        }

        let mut dataset = Array3::from_elem(
            (Band::ALL.len(), sources.len() * SLOTS_PER_DAY, heights.len()),
            NO_DATA,
        );
        let mut timestamps = Vec::with_capacity(sources.len() * SLOTS_PER_DAY);
        let mut measured = Vec::with_capacity(sources.len() * SLOTS_PER_DAY);
        let mut days = Vec::with_capacity(sources.len());

        for (i, source) in sources.iter().enumerate() {
            let offset = i * SLOTS_PER_DAY;
            dataset
                .slice_mut(s![.., offset..offset + SLOTS_PER_DAY, ..])
                .assign(source.data());
            timestamps.extend_from_slice(source.timestamps());
            measured.extend_from_slice(source.measured_slots());
            days.push(source.entry());
        }

        Self::from_parts(name, days, heights, dataset, timestamps, measured)
    }

    /// Build a collection from an already concatenated axis
    ///
    /// Verifies the slot spacing of the whole axis and derives the night index.
    pub fn from_parts(
        name: impl Into<String>,
        days: Vec<DayEntry>,
        heights: Arc<Vec<i32>>,
        dataset: Array3<f64>,
        timestamps: Vec<SodarTimestamp>,
        measured: Vec<bool>,
    ) -> Result<Self> {
        let name = name.into();
        let expected_slots = days.len() * SLOTS_PER_DAY;
        if days.is_empty()
            || timestamps.len() != expected_slots
            || measured.len() != expected_slots
            || dataset.shape() != [Band::ALL.len(), expected_slots, heights.len()]
        {
            return Err(SodarError::configuration(format!(
                "Collection {} has inconsistent parts: {} days, {} timestamps, dataset {:?}",
                name,
                days.len(),
                timestamps.len(),
                dataset.shape()
            )));
        }

        verify_continuity(&timestamps)?;
        let night_index = build_night_index(&days);

        info!(
            "Assembled {}: {} days ({} measured), {} slots, {} nights",
            name,
            days.len(),
            days.iter().filter(|d| d.is_measured()).count(),
            timestamps.len(),
            night_index.len()
        );

        Ok(Self {
            name,
            days,
            heights,
            dataset,
            timestamps,
            measured,
            night_index,
        })
    }

    /// Station name, the directory the logs came from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every day of the axis, in calendar order
    pub fn days(&self) -> &[DayEntry] {
        &self.days
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Labels of the days; placeholders are included only when asked for
    pub fn source_dates(&self, include_placeholders: bool) -> Vec<&str> {
        self.days
            .iter()
            .filter(|day| include_placeholders || day.is_measured())
            .map(|day| day.label.as_str())
            .collect()
    }

    pub fn heights(&self) -> &Arc<Vec<i32>> {
        &self.heights
    }

    /// Full (bands × slots × heights) dataset
    pub fn dataset(&self) -> &Array3<f64> {
        &self.dataset
    }

    /// (slots × heights) view of one band across the whole axis
    pub fn band(&self, band: Band) -> ArrayView2<'_, f64> {
        self.dataset.index_axis(Axis(0), band.index())
    }

    /// Raw timestamps of every slot
    pub fn timestamps(&self) -> &[SodarTimestamp] {
        &self.timestamps
    }

    pub fn slot_count(&self) -> usize {
        self.timestamps.len()
    }

    /// Per-slot provenance: true where the value came from a record
    pub fn measured_slots(&self) -> &[bool] {
        &self.measured
    }

    /// Axis offset of the first slot of every day
    pub fn day_index(&self) -> Vec<usize> {
        (0..self.days.len()).map(|i| i * SLOTS_PER_DAY).collect()
    }

    /// Axis position of a timestamp, if it lies on the axis
    pub fn index_of(&self, timestamp: SodarTimestamp) -> Option<usize> {
        self.timestamps.binary_search(&timestamp).ok()
    }

    /// Every night of the axis, one per adjacent pair of days
    pub fn night_index(&self) -> &[NightDescriptor] {
        &self.night_index
    }
}

/// Insert placeholder days between sources more than one day apart
fn fill_calendar_gaps(name: &str, sources: Vec<DaySource>) -> Result<Vec<DaySource>> {
    let mut sources = sources.into_iter();
    let first = sources.next().ok_or_else(|| SodarError::NoSources {
        path: name.into(),
    })?;

    let heights = Arc::clone(first.heights());
    let template = first.timestamps().to_vec();
    let mut current = first.date();
    let mut filled = vec![first];

    for source in sources {
        let delta = (source.date() - current).num_days();
        if delta < 1 {
            warn!(
                "Day {} ({}) does not follow {} in calendar order",
                source.label(),
                source.date(),
                current
            );
        }
        for offset in 1..delta {
            let date = current + Duration::days(offset);
            debug!("Inserting placeholder day for {}", date);
            filled.push(DaySource::placeholder(date, Arc::clone(&heights), &template)?);
        }
        current = source.date();
        filled.push(source);
    }

    Ok(filled)
}

/// Check that every slot is exactly one sampling interval after its predecessor
pub fn verify_continuity(timestamps: &[SodarTimestamp]) -> Result<()> {
    let interval = Duration::minutes(SAMPLE_INTERVAL_MINUTES as i64);
    let datetimes = timestamps
        .iter()
        .map(|timestamp| timestamp.to_datetime())
        .collect::<Result<Vec<NaiveDateTime>>>()?;

    for (position, pair) in datetimes.windows(2).enumerate() {
        let expected = pair[0] + interval;
        if pair[1] != expected {
            return Err(SodarError::ContinuityViolation {
                position: position + 1,
                previous: timestamps[position].to_string(),
                expected: SodarTimestamp::from_datetime(expected).to_string(),
                found: timestamps[position + 1].to_string(),
            });
        }
    }
    Ok(())
}

/// One night per adjacent day pair; the last day has no following morning
fn build_night_index(days: &[DayEntry]) -> Vec<NightDescriptor> {
    days.windows(2)
        .enumerate()
        .map(|(i, pair)| NightDescriptor {
            label: pair[0].label.clone(),
            date: pair[0].date,
            start: i * SLOTS_PER_DAY + NIGHT_START_SLOT,
            stop: i * SLOTS_PER_DAY + NIGHT_STOP_SLOT,
        })
        .collect()
}
