//! Test utilities for building synthetic daily logs
//!
//! These helpers are shared by the ingestion and series test modules.

use crate::constants::{NO_DATA, SAMPLE_INTERVAL_MINUTES};
use std::fs;
use std::path::{Path, PathBuf};

mod parser_tests;

/// Raw timestamp of a slot on a YYMMDD day
pub fn slot_timestamp(yymmdd: u64, slot: usize) -> u64 {
    let minutes = slot as u64 * SAMPLE_INTERVAL_MINUTES as u64;
    yymmdd * 1_000_000 + (minutes / 60) * 10_000 + (minutes % 60) * 100
}

/// Builder for the text of a daily log
#[derive(Debug, Clone)]
pub struct SdrBuilder {
    heights: Vec<i32>,
    records: Vec<(u64, Vec<f64>, Vec<f64>)>,
}

impl SdrBuilder {
    pub fn new(heights: &[i32]) -> Self {
        Self {
            heights: heights.to_vec(),
            records: Vec::new(),
        }
    }

    /// Add one record group; `NO_DATA` values are written as garbage cells
    pub fn record(mut self, timestamp: u64, speeds: &[f64], directions: &[f64]) -> Self {
        self.records
            .push((timestamp, speeds.to_vec(), directions.to_vec()));
        self
    }

    /// Add a record for every slot of a day with constant values
    pub fn full_day(mut self, yymmdd: u64, speed: f64, direction: f64) -> Self {
        let n = self.heights.len();
        for slot in 0..288 {
            self = self.record(
                slot_timestamp(yymmdd, slot),
                &vec![speed; n],
                &vec![direction; n],
            );
        }
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::from("SODAR DAILY LOG\n");
        let height_cells: String = self.heights.iter().map(|h| format!("{:>6}", h)).collect();
        for (timestamp, speeds, directions) in &self.records {
            out.push_str(&format!("SDR {:012} 0000 STATION\n", timestamp));
            out.push_str(&format!("H  {}\n", height_cells));
            let speed_cells: String = speeds
                .iter()
                .map(|v| {
                    if *v == NO_DATA {
                        "******".to_string()
                    } else {
                        format!("{:>6.2}", v)
                    }
                })
                .collect();
            let direction_cells: String = directions
                .iter()
                .map(|v| {
                    if *v == NO_DATA {
                        "  ****".to_string()
                    } else {
                        format!("{:>6}", *v as i32)
                    }
                })
                .collect();
            out.push_str(&format!("VCL {}\n", speed_cells));
            out.push_str(&format!("DCL {}\n", direction_cells));
        }
        out
    }

    /// Write the log as `<dir>/<name>`
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, self.build()).unwrap();
        path
    }
}
