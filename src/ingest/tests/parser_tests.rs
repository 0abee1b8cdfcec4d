//! Tests for daily log parsing

use super::*;
use crate::error::SodarError;
use crate::ingest::parser::{parse_sdr_file, parse_sdr_str};
use tempfile::TempDir;

#[test]
fn test_parse_basic_records() {
    let content = SdrBuilder::new(&[10, 20, 30])
        .record(120314000000, &[1.25, 2.5, 3.75], &[180.0, 190.0, 200.0])
        .record(120314000500, &[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0])
        .build();

    let parsed = parse_sdr_str(&content, Path::new("0314.sdr")).unwrap();

    assert_eq!(parsed.heights, vec![10, 20, 30]);
    assert_eq!(parsed.record_count(), 2);
    assert_eq!(parsed.timestamps[1].raw(), 120314000500);
    assert_eq!(parsed.speeds[0], vec![1.25, 2.5, 3.75]);
    assert_eq!(parsed.directions[1], vec![10.0, 20.0, 30.0]);
    assert_eq!(parsed.stats.malformed_cells, 0);
    // the free-text first line
    assert_eq!(parsed.stats.ignored_lines, 1);
}

#[test]
fn test_malformed_cells_become_sentinel() {
    let content = SdrBuilder::new(&[10, 20, 30])
        .record(120314000000, &[1.5, NO_DATA, 3.0], &[NO_DATA, 90.0, 45.0])
        .build();

    let parsed = parse_sdr_str(&content, Path::new("0314.sdr")).unwrap();

    assert_eq!(parsed.speeds[0], vec![1.5, NO_DATA, 3.0]);
    assert_eq!(parsed.directions[0], vec![NO_DATA, 90.0, 45.0]);
    assert_eq!(parsed.stats.malformed_cells, 2);
}

#[test]
fn test_direction_cells_must_be_integers() {
    let content = "H      10    20\nSDR 120314000000\nVCL   1.00  2.00\nDCL  180.5   270\n";

    let parsed = parse_sdr_str(content, Path::new("0314.sdr")).unwrap();

    assert_eq!(parsed.directions[0], vec![NO_DATA, 270.0]);
}

#[test]
fn test_heights_read_from_first_declaration_only() {
    let content = "H      10    20\nSDR 120314000000\nVCL   1.00  2.00\nDCL    180   270\nH      99    98    97\n";

    let parsed = parse_sdr_str(content, Path::new("0314.sdr")).unwrap();

    assert_eq!(parsed.heights, vec![10, 20]);
}

#[test]
fn test_value_vectors_match_height_count() {
    // one speed cell short, one direction cell too many
    let content = "H      10    20    30\nSDR 120314000000\nVCL   1.00  2.00\nDCL    180   270    90    45\n";

    let parsed = parse_sdr_str(content, Path::new("0314.sdr")).unwrap();

    assert_eq!(parsed.speeds[0], vec![1.0, 2.0, NO_DATA]);
    assert_eq!(parsed.directions[0], vec![180.0, 270.0, 90.0]);
    assert_eq!(parsed.stats.resized_records, 2);
}

#[test]
fn test_record_count_mismatch_is_fatal() {
    let mut content = SdrBuilder::new(&[10, 20])
        .record(120314000000, &[1.0, 2.0], &[10.0, 20.0])
        .build();
    content.push_str("VCL   3.00  4.00\n");

    let result = parse_sdr_str(&content, Path::new("0314.sdr"));

    match result {
        Err(SodarError::RecordCountMismatch {
            speeds,
            directions,
            timestamps,
            ..
        }) => {
            assert_eq!(speeds, 2);
            assert_eq!(directions, 1);
            assert_eq!(timestamps, 1);
        }
        other => panic!("Expected RecordCountMismatch, got {:?}", other),
    }
}

#[test]
fn test_bad_timestamp_is_fatal() {
    let content = "H      10\nSDR 12031400000x\nVCL   1.00\nDCL    180\n";

    let result = parse_sdr_str(content, Path::new("0314.sdr"));

    assert!(matches!(
        result,
        Err(SodarError::InvalidRecord { line: 2, .. })
    ));
}

#[test]
fn test_missing_heights_is_fatal() {
    let content = "SDR 120314000000\nVCL   1.00\nDCL    180\n";

    let result = parse_sdr_str(content, Path::new("0314.sdr"));

    assert!(matches!(result, Err(SodarError::MissingHeights { .. })));
}

#[test]
fn test_parse_from_disk_with_crlf() {
    let temp_dir = TempDir::new().unwrap();
    let content = SdrBuilder::new(&[10, 20])
        .record(120314000000, &[1.0, 2.0], &[10.0, 20.0])
        .build()
        .replace('\n', "\r\n");
    let path = temp_dir.path().join("0314.sdr");
    fs::write(&path, content).unwrap();

    let parsed = parse_sdr_file(&path).unwrap();

    assert_eq!(parsed.heights, vec![10, 20]);
    assert_eq!(parsed.speeds[0], vec![1.0, 2.0]);
    assert_eq!(parsed.directions[0], vec![10.0, 20.0]);
}

#[test]
fn test_parse_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = parse_sdr_file(&temp_dir.path().join("0101.sdr"));
    assert!(matches!(result, Err(SodarError::Io(_))));
}

#[test]
fn test_non_ascii_cell_spoils_only_itself() {
    let content = "H      10    20    30\nSDR 120314000000\nVCL   1.00 °2.00  3.00\nDCL    180   190   200\n";

    let parsed = parse_sdr_str(content, Path::new("0314.sdr")).unwrap();

    assert_eq!(parsed.speeds[0], vec![1.0, NO_DATA, 3.0]);
    assert_eq!(parsed.directions[0], vec![180.0, 190.0, 200.0]);
    assert_eq!(parsed.stats.malformed_cells, 1);
}
