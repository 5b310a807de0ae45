//! Functions and tools for scoring spline fits
//!
//! Every knot count in a sweep is scored by comparing the resampled fit against
//! the filtered reflectance it was fitted to.
//!
//! # Error Metrics
//! - [`mean_squared_error`]: Average squared difference between observed and predicted values. Lower is better.
//! - [`root_mean_squared_error`]: Square root of MSE, giving error in reflectance units. Lower is better.
//!
//! # Model Fit
//! - [`r_squared`]: Proportion of variance explained by the fit. Higher is better, at most 1.
//!   - Returns `None` when the observed values have no variance to explain.
//!
//! # Descriptive Statistics
//! - [`mean`]: Arithmetic mean of a dataset.
//!
//! # Scoring a fit
//! - [`FitMetrics`]: all three numbers for one knot count, see [`FitMetrics::evaluate`].
//!
//! # Examples
//!
//! ```rust
//! use knotfit::statistics::{r_squared, FitMetrics};
//!
//! let y = vec![1.0, 2.0, 3.0];
//! let y_fit = vec![1.1, 1.9, 3.05];
//!
//! let r2 = r_squared(y.iter().copied(), y_fit.iter().copied()).unwrap();
//! println!("R² = {r2}");
//!
//! let metrics = FitMetrics::evaluate(8, &y, &y_fit).unwrap();
//! assert_eq!(metrics.knot_count, 8);
//! ```
use crate::error::{Error, Result};

/// Computes the arithmetic mean of a sequence of values.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// Mean = (Σ x_i) / N
/// where
///   x_i = each value in the dataset, N = total number of values
/// ```
/// </div>
///
/// Returns NaN if the iterator yields no elements.
///
/// # Examples
/// ```rust
/// let values = vec![1.0, 2.0, 3.0];
/// let m = knotfit::statistics::mean(values.into_iter());
/// assert_eq!(m, 2.0);
/// ```
pub fn mean(data: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0.0;
    for value in data {
        sum += value;
        count += 1.0;
    }
    sum / count
}

/// Computes the mean squared error (MSE) between two sets of values.
///
/// MSE is a measure of the average squared difference between the
/// observed (`y`) and predicted (`y_fit`) values. Lower values indicate
/// a better fit.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// MSE = (Σ (y_i - y_fit_i)²) / N
/// where
///   y_i = observed values, y_fit_i = predicted values,
///   N = number of observations
/// ```
/// </div>
///
/// Pairs are taken positionally; the shorter iterator ends the sum.
///
/// # Example
/// ```rust
/// # use knotfit::statistics::mean_squared_error;
/// let y = vec![1.0, 2.0, 3.0];
/// let y_fit = vec![1.0, 2.0, 5.0];
/// assert_eq!(mean_squared_error(y.into_iter(), y_fit.into_iter()), 4.0 / 3.0);
/// ```
pub fn mean_squared_error(y: impl Iterator<Item = f64>, y_fit: impl Iterator<Item = f64>) -> f64 {
    let (mse, _) = mse_with_n(y, y_fit);
    mse
}

/// Computes the root mean squared error (RMSE) between two sets of values.
///
/// Same units as the observed values, which makes it easier to read than
/// [`mean_squared_error`].
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// RMSE = sqrt( (Σ (y_i - y_fit_i)²) / N )
/// ```
/// </div>
///
/// # Example
/// ```rust
/// # use knotfit::statistics::root_mean_squared_error;
/// let y = vec![0.0, 0.0];
/// let y_fit = vec![3.0, -3.0];
/// assert_eq!(root_mean_squared_error(y.into_iter(), y_fit.into_iter()), 3.0);
/// ```
pub fn root_mean_squared_error(
    y: impl Iterator<Item = f64>,
    y_fit: impl Iterator<Item = f64>,
) -> f64 {
    mean_squared_error(y, y_fit).sqrt()
}

/// Calculate the R-squared value for a set of data.
///
/// R-squared tells you how well the fit explains the data:
/// - `1` means the fit explains all the variation.
/// - `0` means it does no better than the mean.
/// - Negative values mean it does worse than the mean.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// R-squared is calculated as:
/// ```math
/// R² = 1 - (SS_res / SS_tot)
/// where
///   SS_res = Σ (y_i - y_fit_i)²
///   SS_tot = Σ (y_i - y_mean)²
/// ```
/// `SS_tot` is treated as zero when it is within the rounding noise of summing
/// `N` values, `SS_tot ≤ N · (4 · N · ε · max|y_i|)²`.
/// </div>
///
/// # Returns
/// The proportion of variance explained, or `None` if `y` has zero variance.
///
/// # Example
/// ```rust
/// # use knotfit::statistics::r_squared;
/// let y = vec![1.0, 2.0, 3.0];
/// let y_fit = vec![2.0, 2.0, 2.0];
/// assert_eq!(r_squared(y.into_iter(), y_fit.into_iter()), Some(0.0));
///
/// let flat = vec![0.5, 0.5, 0.5];
/// assert_eq!(r_squared(flat.clone().into_iter(), flat.into_iter()), None);
/// ```
pub fn r_squared(y: impl Iterator<Item = f64>, y_fit: impl Iterator<Item = f64>) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = y.zip(y_fit).collect();
    if pairs.is_empty() {
        return None;
    }

    let y_mean = mean(pairs.iter().map(|(y, _)| *y));

    //
    // Sum of (y - y_fit)^2
    // Sum of (y - y_mean)^2
    let mut ss_total = 0.0;
    let mut ss_residual = 0.0;
    let mut y_max = 0.0_f64;
    for &(y, y_fit) in &pairs {
        ss_total += (y - y_mean).powi(2);
        ss_residual += (y - y_fit).powi(2);
        y_max = y_max.max(y.abs());
    }

    let n = pairs.len() as f64;
    let noise_floor = n * (4.0 * n * f64::EPSILON * y_max).powi(2);
    if ss_total <= noise_floor {
        return None;
    }

    Some(1.0 - ss_residual / ss_total)
}

fn mse_with_n(y: impl Iterator<Item = f64>, y_fit: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut sum = 0.0;
    let mut n = 0.0;
    for (y, y_fit) in y.zip(y_fit) {
        sum += (y - y_fit).powi(2);
        n += 1.0;
    }
    (sum / n, n)
}

/// Quality of one spline fit.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FitMetrics {
    /// Number of interior knots the fit used
    pub knot_count: usize,
    /// Mean squared error, never negative
    pub mse: f64,
    /// Root mean squared error, never negative
    pub rmse: f64,
    /// Coefficient of determination, at most 1
    pub r_squared: f64,
}
impl FitMetrics {
    /// Scores a resampled fit against the observed reflectance.
    ///
    /// Values are compared positionally.
    ///
    /// # Errors
    /// - [`Error::LengthMismatch`] if the two slices differ in length
    /// - [`Error::UndefinedRSquared`] if `observed` has zero variance; the
    ///   error carries the MSE, which is still defined
    pub fn evaluate(knot_count: usize, observed: &[f64], fitted: &[f64]) -> Result<Self> {
        if observed.len() != fitted.len() {
            return Err(Error::LengthMismatch {
                expected: observed.len(),
                found: fitted.len(),
            });
        }

        let mse = mean_squared_error(observed.iter().copied(), fitted.iter().copied());
        let r_squared = r_squared(observed.iter().copied(), fitted.iter().copied())
            .ok_or(Error::UndefinedRSquared { mse })?;

        Ok(Self {
            knot_count,
            mse,
            rmse: mse.sqrt(),
            r_squared,
        })
    }
}
