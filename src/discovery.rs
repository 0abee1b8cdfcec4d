//! File discovery for SoDAR station directories
//!
//! Finds the daily log files of one station and resolves the expected
//! station directories under a shared root.

use crate::constants::FILE_NAME_PATTERN;
use crate::error::{Result, SodarError};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File discovery component for one station directory
#[derive(Debug)]
pub struct FileDiscovery {
    station_path: PathBuf,
    extension: String,
    skipped_count: usize,
}

impl FileDiscovery {
    /// Create a new file discovery instance
    pub fn new(station_path: PathBuf, extension: impl Into<String>) -> Self {
        Self {
            station_path,
            extension: extension.into(),
            skipped_count: 0,
        }
    }

    /// Data files whose name did not start with an MMDD prefix
    pub fn skipped_count(&self) -> usize {
        self.skipped_count
    }

    /// Discover the daily logs of the station, sorted by file name
    ///
    /// Station directories look like this; sub-directories are searched too:
    /// ```text
    /// primet/
    ///   0312.sdr
    ///   0313.sdr
    ///   0316.SDR
    ///   notes.txt          ignored
    /// ```
    /// With MMDD names a plain file name sort is chronological.
    pub fn discover_day_files(&mut self) -> Result<Vec<PathBuf>> {
        if !self.station_path.is_dir() {
            return Err(SodarError::DirectoryNotFound {
                path: self.station_path.clone(),
            });
        }

        debug!("Searching for daily logs in: {}", self.station_path.display());

        let name_pattern = Regex::new(FILE_NAME_PATTERN)
            .map_err(|e| SodarError::configuration(format!("Bad file name pattern: {}", e)))?;
        let mut files = Vec::new();
        self.skipped_count = 0;

        for entry in WalkDir::new(&self.station_path) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !has_extension(path, &self.extension) {
                continue;
            }
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name_pattern.is_match(file_name) {
                files.push(path.to_path_buf());
            } else {
                warn!("Skipping {}: name does not start with MMDD", path.display());
                self.skipped_count += 1;
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        debug!(
            "Found {} daily logs ({} skipped)",
            files.len(),
            self.skipped_count
        );

        if files.is_empty() {
            return Err(SodarError::NoSources {
                path: self.station_path.clone(),
            });
        }
        Ok(files)
    }
}

/// Check a path's extension, ignoring case
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Resolve the named station directories under `root`
pub fn require_station_dirs(root: &Path, names: &[&str]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(SodarError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    names
        .iter()
        .map(|name| {
            let path = root.join(name);
            if path.is_dir() {
                Ok(path)
            } else {
                Err(SodarError::DirectoryNotFound { path })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Helper to create a station directory with a few daily logs
    fn create_test_station(temp_dir: &TempDir) -> PathBuf {
        let station_path = temp_dir.path().join("primet");
        fs::create_dir_all(station_path.join("extra")).unwrap();

        fs::write(station_path.join("0313.sdr"), "test data").unwrap();
        fs::write(station_path.join("0312.sdr"), "test data").unwrap();
        fs::write(station_path.join("0316.SDR"), "test data").unwrap();
        fs::write(station_path.join("extra").join("0314.sdr"), "test data").unwrap();

        // Files that should be ignored or skipped
        fs::write(station_path.join("notes.txt"), "metadata").unwrap();
        fs::write(station_path.join("readme.sdr"), "not a day").unwrap();

        station_path
    }

    #[test]
    fn test_discover_day_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let station_path = create_test_station(&temp_dir);

        let mut discovery = FileDiscovery::new(station_path, "sdr");
        let files = discovery.discover_day_files().unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["0312.sdr", "0313.sdr", "0314.sdr", "0316.SDR"]);
        assert_eq!(discovery.skipped_count(), 1);
    }

    #[test]
    fn test_discover_empty_station() {
        let temp_dir = TempDir::new().unwrap();
        let station_path = temp_dir.path().join("mcrae");
        fs::create_dir_all(&station_path).unwrap();

        let mut discovery = FileDiscovery::new(station_path.clone(), "sdr");
        let result = discovery.discover_day_files();

        match result {
            Err(SodarError::NoSources { path }) => assert_eq!(path, station_path),
            other => panic!("Expected NoSources error, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let station_path = temp_dir.path().join("missing");

        let mut discovery = FileDiscovery::new(station_path, "sdr");

        assert!(matches!(
            discovery.discover_day_files(),
            Err(SodarError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("0312.sdr"), "sdr"));
        assert!(has_extension(Path::new("/path/to/0312.SDR"), "sdr"));
        assert!(has_extension(Path::new("0312.Sdr"), "sdr"));
        assert!(!has_extension(Path::new("0312.txt"), "sdr"));
        assert!(!has_extension(Path::new("0312"), "sdr"));
    }

    #[test]
    fn test_require_station_dirs() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("mcrae")).unwrap();
        fs::create_dir_all(temp_dir.path().join("primet")).unwrap();

        let dirs = require_station_dirs(temp_dir.path(), &["mcrae", "primet"]).unwrap();
        assert_eq!(dirs.len(), 2);
        assert!(dirs[0].ends_with("mcrae"));

        let result = require_station_dirs(temp_dir.path(), &["mcrae", "other"]);
        match result {
            Err(SodarError::DirectoryNotFound { path }) => assert!(path.ends_with("other")),
            other => panic!("Expected DirectoryNotFound error, got {:?}", other),
        }
    }
}
