//! Command-line interface components.

use crate::cache::ParquetCache;
use crate::config::SodarConfig;
use crate::constants::{DEFAULT_STATIONS, INTERPOLATE_WINDOW, is_missing};
use crate::discovery::require_station_dirs;
use crate::extract::{ExtractedBatch, ExtractionPolicy, ExtractionRequest, PolicyFlag};
use crate::models::Band;
use crate::series::{NightSelection, SeriesAssembler, SodarCollection};
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "sodar-nights")]
#[command(about = "Assemble daily SoDAR logs and extract repaired night windows")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Station directory, or the root holding station directories with --stations/--paired
    #[arg(value_name = "STATION_PATH")]
    pub station_path: PathBuf,

    /// Station sub-directories to process under STATION_PATH
    #[arg(long, value_delimiter = ',', conflicts_with = "paired")]
    pub stations: Vec<String>,

    /// Process the default station pair under STATION_PATH
    #[arg(long)]
    pub paired: bool,

    /// Band to extract (speed(s) or direction(s))
    #[arg(short, long, default_value = "speed")]
    pub band: String,

    /// Night selection mode (all, complete, partial)
    #[arg(short, long, default_value = "complete")]
    pub mode: String,

    /// Explicit night labels (MMDD of the evening day), overrides --mode
    #[arg(short, long, value_delimiter = ',', conflicts_with = "mode")]
    pub nights: Vec<String>,

    /// Repair policies (raw, clamp, interpolate, fill)
    #[arg(short, long, value_delimiter = ',', default_value = "raw")]
    pub repair: Vec<String>,

    /// Constant written by the fill policy
    #[arg(long, allow_hyphen_values = true)]
    pub fill_value: Option<f64>,

    /// Columns searched on each side of a gap by interpolation
    #[arg(long, default_value_t = INTERPOLATE_WINDOW)]
    pub window: usize,

    /// First height row to keep
    #[arg(long, default_value_t = 0)]
    pub min_row: usize,

    /// One past the last height row to keep (default: every height)
    #[arg(long)]
    pub max_row: Option<usize>,

    /// Neither read nor write the series cache
    #[arg(long)]
    pub no_cache: bool,

    /// Delete the series cache before assembling
    #[arg(long, conflicts_with = "no_cache")]
    pub rebuild: bool,

    /// Enable verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Decode --mode, --nights, --repair and --fill-value
    pub fn extraction_policy(&self) -> Result<ExtractionPolicy> {
        let mut flags = self
            .repair
            .iter()
            .map(|name| name.parse::<PolicyFlag>())
            .collect::<crate::Result<Vec<_>>>()?;

        if self.nights.is_empty() {
            let mode = self.mode.parse::<PolicyFlag>()?;
            if !mode.is_selection() {
                anyhow::bail!("--mode takes all, complete or partial, not {}", mode);
            }
            flags.push(mode);
        } else if let Some(flag) = flags.iter().find(|f| f.is_selection()) {
            anyhow::bail!("--repair cannot carry the selection flag {}", flag);
        }

        let mut policy =
            ExtractionPolicy::from_flags_with_window(&flags, self.fill_value, self.window)?;
        if !self.nights.is_empty() {
            policy.selection = NightSelection::Labels(self.nights.clone());
        }
        Ok(policy)
    }

    pub fn config(&self) -> SodarConfig {
        let mut config = SodarConfig::default().with_interpolate_window(self.window);
        if self.no_cache {
            config = config.without_cache();
        }
        if !self.quiet {
            config = config.with_progress();
        }
        config
    }

    /// Station directories to process
    pub fn station_paths(&self) -> Result<Vec<PathBuf>> {
        let names: Vec<&str> = if self.paired {
            DEFAULT_STATIONS.to_vec()
        } else {
            self.stations.iter().map(String::as_str).collect()
        };
        if names.is_empty() {
            return Ok(vec![self.station_path.clone()]);
        }
        Ok(require_station_dirs(&self.station_path, &names)?)
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the flag-derived level
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sodar_nights={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Assemble every requested station and extract its nights
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;

    let band = Band::from_name(&args.band)?;
    let policy = args.extraction_policy()?;
    let config = args.config();
    config.validate()?;

    for station_path in args.station_paths()? {
        if args.rebuild {
            let cache_path = station_path.join(&config.cache_file_name);
            if cache_path.is_file() {
                fs::remove_file(&cache_path).with_context(|| {
                    format!("Failed to remove cache {}", cache_path.display())
                })?;
                info!("Removed cache {}", cache_path.display());
            }
        }

        let assembler =
            SeriesAssembler::new(config.clone()).with_cache(Box::new(ParquetCache));
        let series = assembler
            .assemble(&station_path)
            .with_context(|| format!("Failed to assemble {}", station_path.display()))?;

        let request = ExtractionRequest::new(band)
            .with_policy(policy.clone())
            .with_rows(args.min_row, args.max_row);
        let batch = series
            .extract(&request)
            .with_context(|| format!("Failed to extract nights from {}", series.name()))?;

        if !args.quiet {
            print_summary(&series, &batch);
        }
    }
    Ok(())
}

fn print_summary(series: &SodarCollection, batch: &ExtractedBatch) {
    let measured = series.source_dates(false).len();
    println!("\n{}", format!("Station {}", series.name()).bright_green().bold());
    println!(
        "   • Days: {} ({} measured, {} placeholder)",
        series.day_count(),
        measured,
        series.day_count() - measured
    );
    println!("   • Heights: {:?}", series.heights().as_slice());
    println!("   • Nights available: {}", series.night_index().len());
    println!(
        "   • Extracted: {} {} nights over heights {:?}",
        batch.len().to_string().bright_yellow().bold(),
        batch.band,
        batch.heights
    );
    println!(
        "   • Repaired: {} interpolated, {} clamped, {} filled",
        batch.stats.interpolated, batch.stats.clamped, batch.stats.filled
    );

    let missing = batch.missing_count();
    if missing > 0 {
        println!("   • {}", format!("{} cells still missing", missing).yellow());
    }
    for (night, array) in batch.nights.iter().zip(&batch.arrays) {
        let valid = array.iter().filter(|v| !is_missing(**v)).count();
        println!(
            "     {} {}  {}/{} cells",
            night.label.cyan(),
            night.date,
            valid,
            array.len()
        );
    }
}
