//! Core data structures and types for SoDAR processing.
//!
//! Defines the measured bands, the raw SoDAR timestamp encoding, the
//! origin of each day in a collection and the night descriptors used to
//! slice the assembled series.

use crate::constants::{SAMPLE_INTERVAL_MINUTES, TIMESTAMP_CENTURY, TIMESTAMP_DIGITS};
use crate::error::{Result, SodarError};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical quantity stored in one band of a day array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Speed,
    Direction,
}

impl Band {
    /// All bands, in storage order
    pub const ALL: [Band; 2] = [Band::Speed, Band::Direction];

    /// Index of this band along the first array axis
    pub fn index(self) -> usize {
        match self {
            Band::Speed => 0,
            Band::Direction => 1,
        }
    }

    /// Column prefix used when a band is persisted
    pub fn name(self) -> &'static str {
        match self {
            Band::Speed => "speed",
            Band::Direction => "direction",
        }
    }

    /// Resolve a band from its singular or plural name
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "speed" | "speeds" => Ok(Band::Speed),
            "direction" | "directions" => Ok(Band::Direction),
            other => Err(SodarError::configuration(format!(
                "Unknown band '{}'. Use speed(s) or direction(s)",
                other
            ))),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw SoDAR timestamp, a 12 digit YYMMDDHHMMSS value such as 120314124500
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SodarTimestamp(u64);

impl SodarTimestamp {
    /// Parse the digits of a timestamp record, validating the calendar value
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.len() != TIMESTAMP_DIGITS || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SodarError::InvalidTimestamp {
                value: trimmed.to_string(),
                reason: format!("expected {} digits", TIMESTAMP_DIGITS),
            });
        }
        let raw: u64 = trimmed.parse().map_err(|e| SodarError::InvalidTimestamp {
            value: trimmed.to_string(),
            reason: format!("{}", e),
        })?;
        Self::from_raw(raw)
    }

    /// Wrap a raw encoded value, validating the calendar value
    pub fn from_raw(raw: u64) -> Result<Self> {
        let timestamp = Self(raw);
        timestamp.to_datetime()?;
        Ok(timestamp)
    }

    /// Encode a date and time
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        let year = (datetime.year() - TIMESTAMP_CENTURY).rem_euclid(100) as u64;
        let raw = year * 10_000_000_000
            + datetime.month() as u64 * 100_000_000
            + datetime.day() as u64 * 1_000_000
            + datetime.hour() as u64 * 10_000
            + datetime.minute() as u64 * 100
            + datetime.second() as u64;
        Self(raw)
    }

    /// Canonical timestamp of a slot on the given date (seconds are zero)
    pub fn for_slot(date: NaiveDate, slot: usize) -> Self {
        let minutes = slot as u32 * SAMPLE_INTERVAL_MINUTES;
        let datetime = date.and_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or_default();
        Self::from_datetime(datetime)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    fn field(self, position: u32) -> u32 {
        ((self.0 / 10u64.pow(position)) % 100) as u32
    }

    /// Decode into a calendar date and time
    pub fn to_datetime(self) -> Result<NaiveDateTime> {
        let invalid = |reason: &str| SodarError::InvalidTimestamp {
            value: format!("{:012}", self.0),
            reason: reason.to_string(),
        };
        if self.0 >= 1_000_000_000_000 {
            return Err(invalid("more than 12 digits"));
        }
        let date = NaiveDate::from_ymd_opt(
            TIMESTAMP_CENTURY + self.field(10) as i32,
            self.field(8),
            self.field(6),
        )
        .ok_or_else(|| invalid("not a calendar date"))?;
        date.and_hms_opt(self.field(4), self.field(2), self.field(0))
            .ok_or_else(|| invalid("not a time of day"))
    }

    /// Calendar date of this timestamp
    pub fn date(self) -> Result<NaiveDate> {
        Ok(self.to_datetime()?.date())
    }

    /// Slot index within its day, `(hour * 60 + minute) / interval`
    pub fn slot_index(self) -> usize {
        ((self.field(4) * 60 + self.field(2)) / SAMPLE_INTERVAL_MINUTES) as usize
    }

    /// Same time of day moved onto another date
    pub fn with_date(self, date: NaiveDate) -> Result<Self> {
        let time = self.to_datetime()?.time();
        Ok(Self::from_datetime(date.and_time(time)))
    }
}

impl fmt::Display for SodarTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:012}", self.0)
    }
}

/// Format a date as the MMDD name used for daily log files
pub fn date_to_label(date: NaiveDate) -> String {
    format!("{:02}{:02}", date.month(), date.day())
}

/// Whether a day holds measurements or was synthesized to fill a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOrigin {
    Measured,
    Placeholder,
}

/// Summary of one day of an assembled collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub label: String,
    pub date: NaiveDate,
    pub origin: DayOrigin,
}

impl DayEntry {
    pub fn is_measured(&self) -> bool {
        self.origin == DayOrigin::Measured
    }
}

/// One night of the series: axis offsets from the evening slot of a day
/// through the morning slot of the next day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightDescriptor {
    /// Label (MMDD) of the evening day
    pub label: String,
    /// Calendar date of the evening day
    pub date: NaiveDate,
    /// First axis slot of the night
    pub start: usize,
    /// One past the last axis slot of the night
    pub stop: usize,
}

impl NightDescriptor {
    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop == self.start
    }
}
