//! Daily SoDAR log parsing.
//!
//! A daily log is line oriented. Each line starts with a three character tag:
//!
//! ```text
//! H     10    20    30          height declaration, whitespace separated
//! SDR 120314000000 ...          timestamp of the following record group
//! VCL   1.25  2.50******        speeds, one 6-wide cell per height
//! DCL    180   190   200        directions, one 6-wide cell per height
//! ```
//!
//! Cells that do not parse become the missing-value sentinel; only
//! structural problems (record counts that disagree, unreadable
//! timestamps, no height line) fail the file.

use crate::constants::{
    CELL_WIDTH, NO_DATA, PAYLOAD_OFFSET, TAG_DIRECTION, TAG_HEIGHTS, TAG_SPEED, TAG_TIMESTAMP,
    TAG_WIDTH, TIMESTAMP_DIGITS,
};
use crate::error::{Result, SodarError};
use crate::models::SodarTimestamp;
use std::path::Path;
use tracing::{debug, info};

/// Raw content of one daily log
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDay {
    /// Measurement heights, from the first height declaration
    pub heights: Vec<i32>,
    /// One timestamp per record group, in file order
    pub timestamps: Vec<SodarTimestamp>,
    /// Speed values per record, each as long as `heights`
    pub speeds: Vec<Vec<f64>>,
    /// Direction values per record, each as long as `heights`
    pub directions: Vec<Vec<f64>>,
    pub stats: ParseStats,
}

impl ParsedDay {
    /// Number of record groups in the file
    pub fn record_count(&self) -> usize {
        self.timestamps.len()
    }
}

/// Counters collected while reading one log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub total_lines: usize,
    pub ignored_lines: usize,
    pub malformed_cells: usize,
    /// Records whose cell count differed from the height count
    pub resized_records: usize,
}

/// Read and parse a daily log from disk
pub fn parse_sdr_file(path: &Path) -> Result<ParsedDay> {
    let content = std::fs::read_to_string(path)?;
    let parsed = parse_sdr_str(&content, path)?;
    info!(
        "Parsed {}: {} records over {} heights",
        path.display(),
        parsed.record_count(),
        parsed.heights.len()
    );
    Ok(parsed)
}

/// Parse the text of a daily log; `path` is only used in error reports
pub fn parse_sdr_str(content: &str, path: &Path) -> Result<ParsedDay> {
    let mut heights: Option<Vec<i32>> = None;
    let mut timestamps = Vec::new();
    let mut speeds = Vec::new();
    let mut directions = Vec::new();
    let mut stats = ParseStats::default();

    for (line_num, line) in content.lines().enumerate() {
        stats.total_lines += 1;
        let line = line.trim_end_matches('\r');
        let Some(tag) = line.get(..TAG_WIDTH) else {
            stats.ignored_lines += 1;
            continue;
        };

        match tag {
            TAG_HEIGHTS => {
                if heights.is_none() {
                    heights = Some(parse_heights(&line[TAG_WIDTH..], path, line_num + 1)?);
                }
            }
            TAG_TIMESTAMP => {
                timestamps.push(parse_timestamp(line, path, line_num + 1)?);
            }
            TAG_SPEED => {
                speeds.push(parse_cells(payload(line), parse_speed_cell, &mut stats));
            }
            TAG_DIRECTION => {
                directions.push(parse_cells(payload(line), parse_direction_cell, &mut stats));
            }
            _ => stats.ignored_lines += 1,
        }
    }

    if speeds.len() != directions.len() || speeds.len() != timestamps.len() {
        return Err(SodarError::RecordCountMismatch {
            path: path.to_path_buf(),
            speeds: speeds.len(),
            directions: directions.len(),
            timestamps: timestamps.len(),
        });
    }

    let heights = heights.ok_or_else(|| SodarError::MissingHeights {
        path: path.to_path_buf(),
    })?;

    for values in speeds.iter_mut().chain(directions.iter_mut()) {
        if values.len() != heights.len() {
            stats.resized_records += 1;
            values.resize(heights.len(), NO_DATA);
        }
    }

    debug!(
        "{}: {} lines, {} ignored, {} malformed cells, {} resized records",
        path.display(),
        stats.total_lines,
        stats.ignored_lines,
        stats.malformed_cells,
        stats.resized_records
    );

    Ok(ParsedDay {
        heights,
        timestamps,
        speeds,
        directions,
        stats,
    })
}

/// Text after the tag and separator, counted in characters
fn payload(line: &str) -> &str {
    line.char_indices()
        .nth(PAYLOAD_OFFSET)
        .map(|(start, _)| &line[start..])
        .unwrap_or_default()
}

fn parse_heights(text: &str, path: &Path, line: usize) -> Result<Vec<i32>> {
    text.split_whitespace()
        .map(|token| {
            token.parse::<i32>().map_err(|e| SodarError::InvalidRecord {
                path: path.to_path_buf(),
                line,
                reason: format!("height '{}' is not an integer ({})", token, e),
            })
        })
        .collect()
}

fn parse_timestamp(line: &str, path: &Path, line_num: usize) -> Result<SodarTimestamp> {
    let digits = line
        .get(PAYLOAD_OFFSET..PAYLOAD_OFFSET + TIMESTAMP_DIGITS)
        .ok_or_else(|| SodarError::InvalidRecord {
            path: path.to_path_buf(),
            line: line_num,
            reason: "timestamp record is too short".to_string(),
        })?;
    SodarTimestamp::parse(digits).map_err(|e| SodarError::InvalidRecord {
        path: path.to_path_buf(),
        line: line_num,
        reason: e.to_string(),
    })
}

/// Split a payload into cells of `CELL_WIDTH` characters, degrading bad
/// cells to the sentinel
///
/// Cells are cut by character, so a stray multi-byte character spoils only
/// its own cell.
fn parse_cells(payload: &str, parse: fn(&str) -> Option<f64>, stats: &mut ParseStats) -> Vec<f64> {
    let chars: Vec<char> = payload.chars().collect();
    chars
        .chunks(CELL_WIDTH)
        .map(|cell| {
            let text: String = cell.iter().collect();
            match parse(&text) {
                Some(value) => value,
                None => {
                    stats.malformed_cells += 1;
                    NO_DATA
                }
            }
        })
        .collect()
}

fn parse_speed_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_direction_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<i32>().ok().map(f64::from)
}
