//! SoDAR Night Series Library
//!
//! Turns a directory of daily SoDAR wind logs into one gapless,
//! calendar-aligned series per station and extracts night windows
//! (18:00 to 06:00) from it, with optional repair of missing readings.
//!
//! This library provides tools for:
//! - Parsing tagged fixed-width daily logs into speed and direction bands
//! - Projecting each day onto a fixed grid of 288 five-minute slots
//! - Filling calendar gaps with placeholder days and verifying slot spacing
//! - Selecting nights by completeness or label and slicing them out
//! - Repairing missing cells by interpolation, clamping or a constant fill
//! - Caching assembled series as Parquet

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod repair;
pub mod series;

// Re-export commonly used types
pub use cache::{CacheKey, NoCache, ParquetCache, SeriesCache};
pub use config::{CollisionPolicy, SodarConfig};
pub use error::{Result, SodarError};
pub use extract::{ExtractedBatch, ExtractionPolicy, ExtractionRequest, PolicyFlag};
pub use ingest::DaySource;
pub use models::{Band, DayEntry, DayOrigin, NightDescriptor, SodarTimestamp};
pub use repair::{RepairPlan, RepairStats};
pub use series::{NightSelection, SeriesAssembler, SodarCollection};
