//! Multi-day series assembly and night extraction
//!
//! - [`collection`] - the gapless, calendar ordered slot axis of a station
//! - [`assembler`] - directory ingestion with an optional cache
//! - [`night`] - night selection and slicing

pub mod assembler;
pub mod collection;
pub mod night;

#[cfg(test)]
pub mod tests;

pub use assembler::SeriesAssembler;
pub use collection::{SodarCollection, verify_continuity};
pub use night::NightSelection;
