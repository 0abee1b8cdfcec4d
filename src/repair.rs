//! Missing-value repair for extracted night windows
//!
//! Every array is repaired row by row along its columns. For a night window
//! a row is one time slot and its columns run up the height profile, so
//! clamping carries the highest valid reading to the top of the profile.
//!
//! Policies compose in a fixed order: interpolate, then clamp, then fill.
//! Interpolation leaves cells with no valid neighbour in reach untouched so
//! the later policies can deal with them.
//!
//! A missing cell is interpolated when a valid cell lies within the window on
//! either side, not only above it, and neighbours are always read from the
//! row as it stood before the pass. Trailing cells within reach of a value
//! are therefore interpolated rather than left for clamping, and a lone value
//! spreads to every missing cell within the window: with a window of 3,
//! `[-1, -1, 5, -1, -1]` becomes `[5, 5, 5, 5, 5]`, and only cells more than
//! 3 columns from any value keep the sentinel.

use crate::constants::{INTERPOLATE_WINDOW, NO_DATA, is_missing};
use crate::error::{Result, SodarError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which repair policies to run over a batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepairPlan {
    pub interpolate: bool,
    pub clamp: bool,
    pub fill: Option<f64>,
    /// Columns searched on each side of a gap by interpolation
    pub window: usize,
}

impl Default for RepairPlan {
    fn default() -> Self {
        Self::raw()
    }
}

/// Cells changed by each policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairStats {
    pub interpolated: usize,
    pub clamped: usize,
    pub filled: usize,
}

impl RepairPlan {
    /// Pass data through unchanged
    pub fn raw() -> Self {
        Self {
            interpolate: false,
            clamp: false,
            fill: None,
            window: INTERPOLATE_WINDOW,
        }
    }

    pub fn with_interpolate(mut self) -> Self {
        self.interpolate = true;
        self
    }

    pub fn with_clamp(mut self) -> Self {
        self.clamp = true;
        self
    }

    pub fn with_fill(mut self, value: f64) -> Self {
        self.fill = Some(value);
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn is_raw(&self) -> bool {
        !self.interpolate && !self.clamp && self.fill.is_none()
    }

    /// Reject plans that could not clear the sentinel
    pub fn validate(&self) -> Result<()> {
        if self.interpolate && self.window == 0 {
            return Err(SodarError::configuration(
                "Interpolation window must be at least 1",
            ));
        }
        if let Some(value) = self.fill {
            if !value.is_finite() || is_missing(value) {
                return Err(SodarError::configuration(format!(
                    "Fill value {} must be finite and differ from the missing-value sentinel {}",
                    value, NO_DATA
                )));
            }
        }
        Ok(())
    }

    /// Repair every array of a batch in place
    pub fn apply(&self, batch: &mut [Array2<f64>]) -> Result<RepairStats> {
        self.validate()?;
        let mut stats = RepairStats::default();
        for array in batch.iter_mut() {
            if self.interpolate {
                stats.interpolated += interpolate(array, self.window);
            }
            if self.clamp {
                stats.clamped += clamp(array);
            }
            if let Some(value) = self.fill {
                stats.filled += fill(array, value);
            }
        }
        debug!(
            "Repaired {} arrays: {} interpolated, {} clamped, {} filled",
            batch.len(),
            stats.interpolated,
            stats.clamped,
            stats.filled
        );
        Ok(stats)
    }
}

/// Carry the last valid value of each row through to its final column
///
/// Rows with no valid value are left alone. Returns the number of cells written.
pub fn clamp(array: &mut Array2<f64>) -> usize {
    let mut written = 0;
    for mut row in array.rows_mut() {
        let Some(last) = (0..row.len()).rev().find(|&i| !is_missing(row[i])) else {
            continue;
        };
        let value = row[last];
        for cell in row.iter_mut().skip(last + 1) {
            *cell = value;
            written += 1;
        }
    }
    written
}

/// Replace each missing cell with the mean of the valid cells up to
/// `window` columns after and before it
///
/// Neighbours are read from the row as it was before this pass, so the
/// result does not depend on visiting order. Returns the number of cells
/// replaced.
pub fn interpolate(array: &mut Array2<f64>, window: usize) -> usize {
    let mut replaced = 0;
    for mut row in array.rows_mut() {
        let original = row.to_vec();
        let width = original.len();
        for col in 0..width {
            if !is_missing(original[col]) {
                continue;
            }
            let after = &original[col + 1..width.min(col + 1 + window)];
            let before = &original[col.saturating_sub(window)..col];
            let candidates: Vec<f64> = after
                .iter()
                .chain(before.iter())
                .copied()
                .filter(|v| !is_missing(*v))
                .collect();
            if candidates.is_empty() {
                continue;
            }
            row[col] = candidates.iter().sum::<f64>() / candidates.len() as f64;
            replaced += 1;
        }
    }
    replaced
}

/// Replace every missing cell with `value`, returning how many were replaced
pub fn fill(array: &mut Array2<f64>, value: f64) -> usize {
    let mut filled = 0;
    array.mapv_inplace(|v| {
        if is_missing(v) {
            filled += 1;
            value
        } else {
            v
        }
    });
    filled
}
