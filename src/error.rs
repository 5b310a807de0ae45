//! Error types for spline knot sweeps
//!
//! This module defines the failure modes encountered while filtering spectra,
//! planning knots, fitting splines and scoring fits, along with a convenient
//! `Result` alias.
//!
//! The first four variants are the per-fit errors a sweep recovers from by
//! recording a failed row; see [`FailureTag`].

use std::path::PathBuf;

/// Errors that can occur while sweeping knot counts over a spectrum.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Too few samples remain after restricting the spectrum to the wavelength band.
    ///
    /// A cubic spline needs at least `degree + 1` samples.
    #[error("Only {found} samples fall inside the wavelength band; at least {required} are needed")]
    InsufficientBand {
        /// Samples left after filtering
        found: usize,
        /// Minimum number of samples
        required: usize,
    },

    /// The requested knot count cannot be placed on the wavelength axis.
    ///
    /// Either the count is out of range for the number of samples, or two knots
    /// rounded onto the same sample index.
    #[error("Cannot place {knots} knots on {samples} samples: {reason}")]
    DegenerateKnotPlan {
        /// Requested number of interior knots
        knots: usize,
        /// Number of filtered samples
        samples: usize,
        /// What went wrong
        reason: &'static str,
    },

    /// The B-spline basis could not be built or solved for the given knots.
    #[error("Spline fit failed with {knots} knots on {samples} samples: {reason}")]
    SplineFit {
        /// Number of interior knots
        knots: usize,
        /// Number of samples
        samples: usize,
        /// What went wrong
        reason: &'static str,
    },

    /// R² is undefined because the observed values have zero variance.
    ///
    /// The mean squared error is still well defined and carried along.
    #[error("R² is undefined for a spectrum with zero variance (MSE = {mse})")]
    UndefinedRSquared {
        /// Mean squared error of the fit
        mse: f64,
    },

    /// A sample inside the wavelength band was missing or non-numeric.
    #[error("Missing reflectance value at {wavelength} nm")]
    MissingSample {
        /// Wavelength of the missing sample
        wavelength: f64,
    },

    /// Two sequences that must be aligned have different lengths.
    #[error("Length mismatch: expected {expected} values, found {found}")]
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        found: usize,
    },

    /// The same wavelength appears twice in a dataset header.
    #[error("Wavelength {0} appears more than once in the dataset header")]
    DuplicateWavelength(f64),

    /// The dataset has no wavelength columns.
    #[error("No wavelength columns found in dataset `{0}`")]
    NoData(String),

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing CSV failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A sweep configuration could not be parsed.
    #[error("Invalid sweep configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A diagnostic plot could not be rendered.
    #[error("Failed to render diagnostic plot: {0}")]
    Render(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for knot sweeps
pub type Result<T> = std::result::Result<T, Error>;

/// Compact, copyable tag stored on a failed result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureTag {
    /// See [`Error::InsufficientBand`]
    InsufficientBand,
    /// See [`Error::DegenerateKnotPlan`]
    DegenerateKnotPlan,
    /// See [`Error::SplineFit`]
    SplineFit,
    /// See [`Error::UndefinedRSquared`]
    UndefinedRSquared,
    /// See [`Error::MissingSample`]
    MissingSample,
    /// See [`Error::LengthMismatch`]
    LengthMismatch,
    /// Any other error
    Other,
}

impl From<&Error> for FailureTag {
    fn from(error: &Error) -> Self {
        match error {
            Error::InsufficientBand { .. } => Self::InsufficientBand,
            Error::DegenerateKnotPlan { .. } => Self::DegenerateKnotPlan,
            Error::SplineFit { .. } => Self::SplineFit,
            Error::UndefinedRSquared { .. } => Self::UndefinedRSquared,
            Error::MissingSample { .. } => Self::MissingSample,
            Error::LengthMismatch { .. } => Self::LengthMismatch,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for FailureTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InsufficientBand => "insufficient_band",
            Self::DegenerateKnotPlan => "degenerate_knot_plan",
            Self::SplineFit => "spline_fit",
            Self::UndefinedRSquared => "undefined_r_squared",
            Self::MissingSample => "missing_sample",
            Self::LengthMismatch => "length_mismatch",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_follow_variants() {
        let err = Error::UndefinedRSquared { mse: 0.0 };
        assert_eq!(FailureTag::from(&err), FailureTag::UndefinedRSquared);

        let err = Error::DuplicateWavelength(400.0);
        assert_eq!(FailureTag::from(&err), FailureTag::Other);
    }

    #[test]
    fn tag_display_is_snake_case() {
        assert_eq!(FailureTag::DegenerateKnotPlan.to_string(), "degenerate_knot_plan");
    }
}
