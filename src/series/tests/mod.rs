//! Test utilities for assembling synthetic stations

use crate::config::CollisionPolicy;
use crate::constants::FALLBACK_YEAR;
use crate::ingest::DaySource;
use crate::ingest::parser::parse_sdr_str;
use crate::ingest::tests::{SdrBuilder, slot_timestamp};
use std::path::Path;


pub const HEIGHTS: &[i32] = &[10, 20, 30];

/// MMDD label of a YYMMDD day
pub fn label_of(yymmdd: u64) -> String {
    format!("{:04}", yymmdd % 10_000)
}

/// A day with a record in every slot holding constant values
pub fn full_day(yymmdd: u64, speed: f64, direction: f64) -> DaySource {
    day_from_builder(
        yymmdd,
        &SdrBuilder::new(HEIGHTS).full_day(yymmdd, speed, direction),
    )
}

/// A day with records in the given slots only
pub fn sparse_day(yymmdd: u64, slots: &[usize], speed: f64) -> DaySource {
    let n = HEIGHTS.len();
    let builder = slots.iter().fold(SdrBuilder::new(HEIGHTS), |builder, slot| {
        builder.record(
            slot_timestamp(yymmdd, *slot),
            &vec![speed; n],
            &vec![180.0; n],
        )
    });
    day_from_builder(yymmdd, &builder)
}

pub fn day_from_builder(yymmdd: u64, builder: &SdrBuilder) -> DaySource {
    let label = label_of(yymmdd);
    let parsed = parse_sdr_str(&builder.build(), Path::new(&label)).unwrap();
    DaySource::from_parsed(label, parsed, CollisionPolicy::default(), FALLBACK_YEAR).unwrap()
}
