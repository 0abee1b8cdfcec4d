//! Station assembly from a directory of daily logs.

use crate::cache::{CacheKey, NoCache, SeriesCache};
use crate::config::SodarConfig;
use crate::discovery::FileDiscovery;
use crate::error::Result;
use crate::ingest::DaySource;
use crate::series::SodarCollection;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Builds a [`SodarCollection`] for one station directory
pub struct SeriesAssembler {
    config: SodarConfig,
    cache: Box<dyn SeriesCache>,
}

impl SeriesAssembler {
    /// Create an assembler that never caches
    pub fn new(config: SodarConfig) -> Self {
        Self {
            config,
            cache: Box::new(NoCache),
        }
    }

    /// Use a cache collaborator for load-before-build and save-after-build
    pub fn with_cache(mut self, cache: Box<dyn SeriesCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &SodarConfig {
        &self.config
    }

    /// Assemble a station, from the cache when possible
    ///
    /// Cache failures never fail the assembly: an unreadable or stale cache
    /// is rebuilt and a failed write only loses the cache.
    pub fn assemble(&self, station_path: &Path) -> Result<SodarCollection> {
        self.config.validate()?;
        let files = self.discover(station_path)?;
        if !self.config.use_cache {
            return self.build(station_path, &files);
        }

        let cache_path = station_path.join(&self.config.cache_file_name);
        let key = CacheKey::new(station_path, &files, &self.config)?;
        match self.cache.load(&cache_path, &key) {
            Ok(Some(series)) => return Ok(series),
            Ok(None) => debug!("Cache miss for {}", station_path.display()),
            Err(e) => warn!(
                "Ignoring unreadable cache {}: {}",
                cache_path.display(),
                e
            ),
        }

        let series = self.build(station_path, &files)?;
        if let Err(e) = self.cache.save(&cache_path, &key, &series) {
            warn!("Could not write cache {}: {}", cache_path.display(), e);
        }
        Ok(series)
    }

    /// Read every daily log of a station and assemble them, bypassing the cache
    pub fn ingest(&self, station_path: &Path) -> Result<SodarCollection> {
        self.config.validate()?;
        let files = self.discover(station_path)?;
        self.build(station_path, &files)
    }

    fn discover(&self, station_path: &Path) -> Result<Vec<PathBuf>> {
        let mut discovery =
            FileDiscovery::new(station_path.to_path_buf(), self.config.file_extension.clone());
        discovery.discover_day_files()
    }

    fn build(&self, station_path: &Path, files: &[PathBuf]) -> Result<SodarCollection> {
        info!(
            "Ingesting {} daily logs from {}",
            files.len(),
            station_path.display()
        );

        let progress_bar = self.progress_bar(files.len());
        let mut sources = Vec::with_capacity(files.len());
        for file in files {
            progress_bar.set_message(
                file.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );
            sources.push(DaySource::from_file(file, &self.config)?);
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        let name = station_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| station_path.display().to_string());
        SodarCollection::from_sources(name, sources)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress_bar.set_style(style.progress_chars("#>-"));
        }
        progress_bar
    }
}
