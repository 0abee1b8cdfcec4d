//! Night extraction requests and policy flags
//!
//! Callers describe what they want either directly with an
//! [`ExtractionRequest`] or as a bag of [`PolicyFlag`]s, which are decoded
//! and checked for coherence by [`ExtractionPolicy::from_flags`].

use crate::constants::{INTERPOLATE_WINDOW, is_missing};
use crate::error::{Result, SodarError};
use crate::models::{Band, NightDescriptor};
use crate::repair::{RepairPlan, RepairStats};
use crate::series::{NightSelection, SodarCollection};
use ndarray::{Array2, Axis, s};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// One flag of the extraction policy encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyFlag {
    All,
    Complete,
    Partial,
    Raw,
    Clamp,
    Interpolate,
    Fill,
}

impl PolicyFlag {
    pub fn is_selection(self) -> bool {
        matches!(self, PolicyFlag::All | PolicyFlag::Complete | PolicyFlag::Partial)
    }

    pub fn is_repair(self) -> bool {
        !self.is_selection()
    }
}

impl fmt::Display for PolicyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyFlag::All => "ALL",
            PolicyFlag::Complete => "COMPLETE",
            PolicyFlag::Partial => "PARTIAL",
            PolicyFlag::Raw => "RAW",
            PolicyFlag::Clamp => "CLAMP",
            PolicyFlag::Interpolate => "INTERPOLATE",
            PolicyFlag::Fill => "FILL",
        };
        f.write_str(name)
    }
}

impl FromStr for PolicyFlag {
    type Err = SodarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(PolicyFlag::All),
            "complete" => Ok(PolicyFlag::Complete),
            "partial" => Ok(PolicyFlag::Partial),
            "raw" => Ok(PolicyFlag::Raw),
            "clamp" => Ok(PolicyFlag::Clamp),
            "interpolate" => Ok(PolicyFlag::Interpolate),
            "fill" => Ok(PolicyFlag::Fill),
            other => Err(SodarError::configuration(format!(
                "Unknown policy flag '{}'",
                other
            ))),
        }
    }
}

/// Decoded, coherent selection and repair configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionPolicy {
    pub selection: NightSelection,
    pub repair: RepairPlan,
}

impl ExtractionPolicy {
    /// Decode a flag set
    ///
    /// At most one selection flag may be given (COMPLETE when none is). RAW
    /// excludes every other repair flag, and FILL needs `fill_value`.
    pub fn from_flags(flags: &[PolicyFlag], fill_value: Option<f64>) -> Result<Self> {
        Self::from_flags_with_window(flags, fill_value, INTERPOLATE_WINDOW)
    }

    pub fn from_flags_with_window(
        flags: &[PolicyFlag],
        fill_value: Option<f64>,
        window: usize,
    ) -> Result<Self> {
        let mut selection_flags: Vec<PolicyFlag> =
            flags.iter().copied().filter(|f| f.is_selection()).collect();
        selection_flags.dedup();
        let selection = match selection_flags.as_slice() {
            [] => NightSelection::default(),
            [PolicyFlag::All] => NightSelection::All,
            [PolicyFlag::Complete] => NightSelection::Complete,
            [PolicyFlag::Partial] => NightSelection::Partial,
            many => {
                let names: Vec<String> = many.iter().map(|f| f.to_string()).collect();
                return Err(SodarError::configuration(format!(
                    "Only one selection flag may be given, found {}",
                    names.join(" and ")
                )));
            }
        };

        let has = |flag: PolicyFlag| flags.contains(&flag);
        if has(PolicyFlag::Raw) && flags.iter().any(|f| f.is_repair() && *f != PolicyFlag::Raw) {
            return Err(SodarError::configuration(
                "RAW cannot be combined with another repair flag",
            ));
        }

        let mut repair = RepairPlan::raw().with_window(window);
        if has(PolicyFlag::Interpolate) {
            repair = repair.with_interpolate();
        }
        if has(PolicyFlag::Clamp) {
            repair = repair.with_clamp();
        }
        if has(PolicyFlag::Fill) {
            let value = fill_value.ok_or_else(|| {
                SodarError::configuration("FILL requires a fill value")
            })?;
            repair = repair.with_fill(value);
        } else if let Some(value) = fill_value {
            warn!("Fill value {} given without FILL; ignoring it", value);
        }
        repair.validate()?;

        Ok(Self { selection, repair })
    }
}

/// What to extract from a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub band: Band,
    pub selection: NightSelection,
    /// First height row kept
    pub min_row: usize,
    /// One past the last height row kept; `None` keeps every row above `min_row`
    pub max_row: Option<usize>,
    pub repair: RepairPlan,
}

impl ExtractionRequest {
    /// Every complete night of one band, all heights, unrepaired
    pub fn new(band: Band) -> Self {
        Self {
            band,
            selection: NightSelection::default(),
            min_row: 0,
            max_row: None,
            repair: RepairPlan::raw(),
        }
    }

    pub fn with_selection(mut self, selection: NightSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_rows(mut self, min_row: usize, max_row: Option<usize>) -> Self {
        self.min_row = min_row;
        self.max_row = max_row;
        self
    }

    pub fn with_repair(mut self, repair: RepairPlan) -> Self {
        self.repair = repair;
        self
    }

    pub fn with_policy(mut self, policy: ExtractionPolicy) -> Self {
        self.selection = policy.selection;
        self.repair = policy.repair;
        self
    }

    /// Resolve the height row range against a profile of `height_count` rows
    pub fn row_range(&self, height_count: usize) -> Result<(usize, usize)> {
        let max_row = self.max_row.unwrap_or(height_count);
        if self.min_row > max_row || max_row > height_count {
            return Err(SodarError::configuration(format!(
                "Invalid height rows {}..{} for a profile of {} heights",
                self.min_row, max_row, height_count
            )));
        }
        Ok((self.min_row, max_row))
    }
}

/// Extracted night windows, owned by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedBatch {
    pub band: Band,
    /// Heights of the kept rows
    pub heights: Vec<i32>,
    /// One (night length × kept heights) array per night
    pub arrays: Vec<Array2<f64>>,
    pub nights: Vec<NightDescriptor>,
    pub stats: RepairStats,
}

impl ExtractedBatch {
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Cells still holding the missing-value sentinel
    pub fn missing_count(&self) -> usize {
        self.arrays
            .iter()
            .map(|array| array.iter().filter(|v| is_missing(**v)).count())
            .sum()
    }

    /// Apply a further repair plan to every night
    pub fn repair(&mut self, plan: &RepairPlan) -> Result<RepairStats> {
        let stats = plan.apply(&mut self.arrays)?;
        self.stats.interpolated += stats.interpolated;
        self.stats.clamped += stats.clamped;
        self.stats.filled += stats.filled;
        Ok(stats)
    }
}

impl SodarCollection {
    /// Select, slice and repair night windows
    pub fn extract(&self, request: &ExtractionRequest) -> Result<ExtractedBatch> {
        let (min_row, max_row) = request.row_range(self.heights().len())?;
        request.repair.validate()?;

        let (nights_array, nights) = self.night_array(request.band, &request.selection)?;
        let arrays: Vec<Array2<f64>> = nights_array
            .axis_iter(Axis(0))
            .map(|night| night.slice(s![.., min_row..max_row]).to_owned())
            .collect();

        let mut batch = ExtractedBatch {
            band: request.band,
            heights: self.heights()[min_row..max_row].to_vec(),
            arrays,
            nights,
            stats: RepairStats::default(),
        };
        if !request.repair.is_raw() {
            batch.repair(&request.repair)?;
        }

        info!(
            "Extracted {} {} nights of {} ({} selection, heights {}..{}, {} cells missing)",
            batch.len(),
            request.band,
            self.name(),
            request.selection,
            min_row,
            max_row,
            batch.missing_count()
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_flag_parsing() {
        assert_eq!("all".parse::<PolicyFlag>().unwrap(), PolicyFlag::All);
        assert_eq!(" INTERPOLATE ".parse::<PolicyFlag>().unwrap(), PolicyFlag::Interpolate);
        assert_eq!("Fill".parse::<PolicyFlag>().unwrap(), PolicyFlag::Fill);
        assert!(matches!(
            "smooth".parse::<PolicyFlag>(),
            Err(SodarError::Configuration { .. })
        ));
    }

    #[test]
    fn test_default_policy() {
        let policy = ExtractionPolicy::from_flags(&[], None).unwrap();

        assert_eq!(policy.selection, NightSelection::Complete);
        assert!(policy.repair.is_raw());
    }

    #[test]
    fn test_combined_repair_flags() {
        let flags = [PolicyFlag::Partial, PolicyFlag::Fill, PolicyFlag::Clamp, PolicyFlag::Interpolate];

        let policy = ExtractionPolicy::from_flags(&flags, Some(0.0)).unwrap();

        assert_eq!(policy.selection, NightSelection::Partial);
        assert!(policy.repair.interpolate);
        assert!(policy.repair.clamp);
        assert_eq!(policy.repair.fill, Some(0.0));
        assert_eq!(policy.repair.window, INTERPOLATE_WINDOW);
    }

    #[test]
    fn test_two_selection_flags_rejected() {
        let result = ExtractionPolicy::from_flags(&[PolicyFlag::All, PolicyFlag::Complete], None);

        assert!(matches!(result, Err(SodarError::Configuration { .. })));
    }

    #[test]
    fn test_repeated_selection_flag_accepted() {
        let policy = ExtractionPolicy::from_flags(&[PolicyFlag::All, PolicyFlag::All], None).unwrap();

        assert_eq!(policy.selection, NightSelection::All);
    }

    #[test]
    fn test_raw_with_repair_rejected() {
        let result = ExtractionPolicy::from_flags(&[PolicyFlag::Raw, PolicyFlag::Clamp], None);
        assert!(matches!(result, Err(SodarError::Configuration { .. })));

        let policy = ExtractionPolicy::from_flags(&[PolicyFlag::Raw, PolicyFlag::All], None).unwrap();
        assert!(policy.repair.is_raw());
    }

    #[test]
    fn test_fill_without_value_rejected() {
        let result = ExtractionPolicy::from_flags(&[PolicyFlag::Fill], None);

        match result {
            Err(SodarError::Configuration { message }) => assert!(message.contains("FILL")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_row_range_validation() {
        let request = ExtractionRequest::new(Band::Speed);
        assert_eq!(request.row_range(5).unwrap(), (0, 5));

        let request = request.with_rows(1, Some(3));
        assert_eq!(request.row_range(5).unwrap(), (1, 3));

        assert!(request.clone().with_rows(3, Some(2)).row_range(5).is_err());
        assert!(request.clone().with_rows(0, Some(6)).row_range(5).is_err());
        assert!(request.with_rows(6, None).row_range(5).is_err());
    }
}
