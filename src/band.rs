//! Wavelength band selection.
//!
//! A [`BandMask`] is derived once per dataset from the shared wavelength axis and
//! then applied identically to the axis and to every spectrum in the dataset.
//!
//! ```rust
//! use knotfit::band::{BandMask, WavelengthBand};
//!
//! let axis = [350.0, 380.0, 500.0, 700.0, 750.0];
//! let mask = BandMask::new(&axis, WavelengthBand::VISIBLE);
//! assert_eq!(mask.apply(&axis), vec![380.0, 500.0, 700.0]);
//! ```
use serde::{Deserialize, Serialize};

use crate::{
    dataset::Cell,
    error::{Error, Result},
    spline::DEGREE,
};

/// Fewest samples a cubic spline can be fitted to.
pub const MIN_SAMPLES: usize = DEGREE + 1;

/// A closed wavelength interval, in nanometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavelengthBand {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
}
impl WavelengthBand {
    /// The visible band, 380 to 700 nm
    pub const VISIBLE: Self = Self {
        min: 380.0,
        max: 700.0,
    };

    /// Whether the wavelength lies inside the band, bounds included.
    #[must_use]
    pub fn contains(&self, wavelength: f64) -> bool {
        wavelength >= self.min && wavelength <= self.max
    }
}
impl Default for WavelengthBand {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Boolean selector over a wavelength axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandMask {
    selected: Vec<bool>,
}
impl BandMask {
    /// Builds the mask for an axis.
    #[must_use]
    pub fn new(axis: &[f64], band: WavelengthBand) -> Self {
        Self {
            selected: axis.iter().map(|&w| band.contains(w)).collect(),
        }
    }

    /// Length of the axis the mask was built for.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether the mask was built for an empty axis.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Number of selected positions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.selected.iter().filter(|&&s| s).count()
    }

    /// Whether position `i` is selected.
    #[must_use]
    pub fn is_selected(&self, i: usize) -> bool {
        self.selected.get(i).copied().unwrap_or(false)
    }

    /// Keeps the selected positions of `values`.
    ///
    /// Positions past the end of the mask are dropped.
    #[must_use]
    pub fn apply<T: Clone>(&self, values: &[T]) -> Vec<T> {
        values
            .iter()
            .zip(&self.selected)
            .filter(|(_, &s)| s)
            .map(|(v, _)| v.clone())
            .collect()
    }

    /// Restricts one spectrum to the band.
    ///
    /// # Errors
    /// - [`Error::LengthMismatch`] if `axis`, `cells` and the mask disagree in length
    /// - [`Error::MissingSample`] if a selected cell is [`Cell::Missing`]
    /// - [`Error::InsufficientBand`] if fewer than [`MIN_SAMPLES`] samples remain
    pub fn filter_spectrum(&self, axis: &[f64], cells: &[Cell]) -> Result<FilteredSpectrum> {
        if axis.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                found: axis.len(),
            });
        }
        if cells.len() != axis.len() {
            return Err(Error::LengthMismatch {
                expected: axis.len(),
                found: cells.len(),
            });
        }

        let mut wavelengths = Vec::with_capacity(self.count());
        let mut reflectance = Vec::with_capacity(self.count());
        for ((&wavelength, cell), _) in axis
            .iter()
            .zip(cells)
            .zip(&self.selected)
            .filter(|(_, &s)| s)
        {
            let value = cell.value().ok_or(Error::MissingSample { wavelength })?;
            wavelengths.push(wavelength);
            reflectance.push(value);
        }

        FilteredSpectrum::new(wavelengths, reflectance)
    }
}

/// A spectrum restricted to a wavelength band, ready for fitting.
///
/// Holds at least [`MIN_SAMPLES`] finite samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSpectrum {
    wavelengths: Vec<f64>,
    reflectance: Vec<f64>,
}
impl FilteredSpectrum {
    /// Wraps already-filtered samples.
    ///
    /// # Errors
    /// - [`Error::LengthMismatch`] if the vectors differ in length
    /// - [`Error::MissingSample`] if a reflectance is not finite
    /// - [`Error::InsufficientBand`] if fewer than [`MIN_SAMPLES`] samples are given
    pub fn new(wavelengths: Vec<f64>, reflectance: Vec<f64>) -> Result<Self> {
        if wavelengths.len() != reflectance.len() {
            return Err(Error::LengthMismatch {
                expected: wavelengths.len(),
                found: reflectance.len(),
            });
        }
        if let Some((&wavelength, _)) = wavelengths
            .iter()
            .zip(&reflectance)
            .find(|(_, r)| !r.is_finite())
        {
            return Err(Error::MissingSample { wavelength });
        }
        if wavelengths.len() < MIN_SAMPLES {
            return Err(Error::InsufficientBand {
                found: wavelengths.len(),
                required: MIN_SAMPLES,
            });
        }

        Ok(Self {
            wavelengths,
            reflectance,
        })
    }

    /// Wavelength axis, strictly increasing if the source axis was.
    #[must_use]
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Reflectance values aligned with [`Self::wavelengths`].
    #[must_use]
    pub fn reflectance(&self) -> &[f64] {
        &self.reflectance
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    /// Always false; a filtered spectrum holds at least [`MIN_SAMPLES`] samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// The `(wavelength, reflectance)` pairs.
    #[must_use]
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.wavelengths
            .iter()
            .copied()
            .zip(self.reflectance.iter().copied())
            .collect()
    }
}
