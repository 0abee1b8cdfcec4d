//! Application constants for the SoDAR night processor
//!
//! Sampling grid, night window offsets, record layout and defaults used
//! throughout ingestion, assembly and repair.

// =============================================================================
// Sampling Grid
// =============================================================================

/// Minutes between two consecutive samples
pub const SAMPLE_INTERVAL_MINUTES: u32 = 5;

/// Number of sampling slots in one calendar day (288 five-minute periods)
pub const SLOTS_PER_DAY: usize = (24 * 60 / SAMPLE_INTERVAL_MINUTES) as usize;

/// Sentinel marking a cell with no measurement
pub const NO_DATA: f64 = -1.0;

/// Returns true when a cell holds the missing-value sentinel
#[inline]
pub fn is_missing(value: f64) -> bool {
    value == NO_DATA
}

// =============================================================================
// Night Window
// =============================================================================

/// First slot of a night, 18:00 on the evening day
pub const NIGHT_START_SLOT: usize = (18 * 60 / SAMPLE_INTERVAL_MINUTES) as usize;

/// One past the last slot of a night, measured from the start of the evening day.
/// The night ends at 06:00 the following morning and includes that slot.
pub const NIGHT_STOP_SLOT: usize = NIGHT_START_SLOT + (12 * 60 / SAMPLE_INTERVAL_MINUTES) as usize + 1;

/// Number of slots in one night window (145)
pub const NIGHT_LENGTH: usize = NIGHT_STOP_SLOT - NIGHT_START_SLOT;

// =============================================================================
// Record Layout
// =============================================================================

/// Height declaration tag
pub const TAG_HEIGHTS: &str = "H  ";

/// Timestamp record tag
pub const TAG_TIMESTAMP: &str = "SDR";

/// Speed record tag
pub const TAG_SPEED: &str = "VCL";

/// Direction record tag
pub const TAG_DIRECTION: &str = "DCL";

/// Width of the leading record tag
pub const TAG_WIDTH: usize = 3;

/// Column where the payload of a value record starts (tag plus one separator)
pub const PAYLOAD_OFFSET: usize = 4;

/// Width of one fixed-width value cell
pub const CELL_WIDTH: usize = 6;

/// Number of digits in a raw timestamp (YYMMDDHHMMSS)
pub const TIMESTAMP_DIGITS: usize = 12;

/// Years in raw timestamps are two digits past this century
pub const TIMESTAMP_CENTURY: i32 = 2000;

// =============================================================================
// Collections and Repair
// =============================================================================

/// Extension of daily log files, matched case-insensitively
pub const DATA_FILE_EXTENSION: &str = "sdr";

/// Pattern every daily log file name must start with (MMDD)
pub const FILE_NAME_PATTERN: &str = r"^(\d{2})(\d{2})";

/// Default cache file written next to the daily logs
pub const CACHE_FILE_NAME: &str = "collection.parquet";

/// How many columns interpolation may look on either side of a gap
pub const INTERPOLATE_WINDOW: usize = 3;

/// Year assumed for a day whose file carries no timestamp records
pub const FALLBACK_YEAR: i32 = 2012;

/// Station sub-directories expected in a paired-station root
pub const DEFAULT_STATIONS: &[&str] = &["mcrae", "primet"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_sizes() {
        assert_eq!(SLOTS_PER_DAY, 288);
        assert_eq!(NIGHT_START_SLOT, 216);
        assert_eq!(NIGHT_STOP_SLOT, 361);
        assert_eq!(NIGHT_LENGTH, 145);
    }

    #[test]
    fn test_night_spans_two_days_only() {
        assert!(NIGHT_STOP_SLOT > SLOTS_PER_DAY);
        assert!(NIGHT_STOP_SLOT <= 2 * SLOTS_PER_DAY);
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(NO_DATA));
        assert!(!is_missing(0.0));
        assert!(!is_missing(-1.5));
    }
}
