//! Placeholder days for calendar gaps.

use crate::constants::{NO_DATA, SLOTS_PER_DAY};
use crate::error::Result;
use crate::ingest::day_source::DaySource;
use crate::models::{Band, DayOrigin, SodarTimestamp, date_to_label};
use chrono::NaiveDate;
use ndarray::Array3;
use std::sync::Arc;

impl DaySource {
    /// All-missing stand-in for a date with no log file
    ///
    /// Heights are shared with the real source the template came from; each
    /// template timestamp keeps its time of day and is moved onto `date`.
    pub fn placeholder(
        date: NaiveDate,
        heights: Arc<Vec<i32>>,
        template: &[SodarTimestamp],
    ) -> Result<Self> {
        let timestamps = if template.len() == SLOTS_PER_DAY {
            template
                .iter()
                .map(|timestamp| timestamp.with_date(date))
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..SLOTS_PER_DAY)
                .map(|slot| SodarTimestamp::for_slot(date, slot))
                .collect()
        };
        let data = Array3::from_elem((Band::ALL.len(), SLOTS_PER_DAY, heights.len()), NO_DATA);

        Ok(Self {
            label: date_to_label(date),
            date,
            origin: DayOrigin::Placeholder,
            heights,
            data,
            timestamps,
            measured: vec![false; SLOTS_PER_DAY],
            collisions: 0,
        })
    }
}
