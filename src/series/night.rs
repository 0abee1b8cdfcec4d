//! Night window selection and extraction.

use crate::constants::NIGHT_LENGTH;
use crate::error::{Result, SodarError};
use crate::models::{Band, NightDescriptor};
use crate::series::SodarCollection;
use ndarray::{Array3, Axis, s};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which nights of a collection to extract
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NightSelection {
    /// Every night, placeholders included
    All,
    /// Nights whose evening and morning days are both measured
    #[default]
    Complete,
    /// Nights with at least one measured bounding day
    Partial,
    /// Nights whose evening day carries one of these labels
    Labels(Vec<String>),
}

impl fmt::Display for NightSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NightSelection::All => f.write_str("all"),
            NightSelection::Complete => f.write_str("complete"),
            NightSelection::Partial => f.write_str("partial"),
            NightSelection::Labels(labels) => write!(f, "labels [{}]", labels.join(", ")),
        }
    }
}

impl SodarCollection {
    /// Night descriptors matching a selection, in night-index order
    pub fn select_nights(&self, selection: &NightSelection) -> Result<Vec<NightDescriptor>> {
        let days = self.days();
        let selected: Vec<NightDescriptor> = self
            .night_index()
            .iter()
            .enumerate()
            .filter(|(i, night)| {
                let evening = days[*i].is_measured();
                let morning = days[*i + 1].is_measured();
                match selection {
                    NightSelection::All => true,
                    NightSelection::Complete => evening && morning,
                    NightSelection::Partial => evening || morning,
                    NightSelection::Labels(labels) => labels.iter().any(|l| *l == night.label),
                }
            })
            .map(|(_, night)| night.clone())
            .collect();

        if selected.is_empty() {
            return Err(SodarError::EmptySelection {
                selection: selection.to_string(),
            });
        }
        debug!(
            "Selected {} of {} nights ({})",
            selected.len(),
            self.night_index().len(),
            selection
        );
        Ok(selected)
    }

    /// Slice the selected nights of one band into a
    /// (nights × night length × heights) array
    pub fn night_array(
        &self,
        band: Band,
        selection: &NightSelection,
    ) -> Result<(Array3<f64>, Vec<NightDescriptor>)> {
        let nights = self.select_nights(selection)?;
        let band_data = self.band(band);
        let mut result = Array3::zeros((nights.len(), NIGHT_LENGTH, self.heights().len()));

        for (mut out, night) in result.axis_iter_mut(Axis(0)).zip(nights.iter()) {
            out.assign(&band_data.slice(s![night.start..night.stop, ..]));
        }

        Ok((result, nights))
    }
}
