//! Ingestion of daily SoDAR logs
//!
//! - [`parser`] - tagged fixed-width record parsing
//! - [`day_source`] - projection of records onto the daily slot grid
//! - [`placeholder`] - all-missing days that fill calendar gaps

pub mod day_source;
pub mod parser;
pub mod placeholder;

#[cfg(test)]
pub mod tests;

pub use day_source::DaySource;
pub use parser::{ParseStats, ParsedDay, parse_sdr_file, parse_sdr_str};
