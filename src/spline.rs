//! Cubic B-spline fitting on fixed knots.
//!
//! A [`BSpline`] is a knot vector plus one coefficient per basis function. The
//! boundary knots are repeated `DEGREE + 1` times (a clamped spline), so with
//! `K` interior knots there are `K + 4` coefficients.
//!
//! # How it works
//! - Builds a **design matrix** with shape `[samples, K + 4]` holding the value
//!   of every B-spline basis function at every sample (Cox–de Boor recursion).
//! - Solves the least-squares system `A * c = y` using the **SVD** of the design
//!   matrix. With zero smoothing this is the whole fit: the spline is as close to
//!   the data as the knots allow.
//! - Evaluates the spline by locating the knot span of `x` and summing the
//!   `DEGREE + 1` non-zero basis functions. Outside the knot range the boundary
//!   polynomial pieces are extended.
//!
//! # Example
//! ```
//! # use knotfit::spline::BSpline;
//! let x: Vec<f64> = (0..20).map(f64::from).collect();
//! let y: Vec<f64> = x.iter().map(|x| x * x).collect();
//!
//! let spline = BSpline::fit_points(&x, &y, &[4.0, 8.0, 12.0, 16.0]).unwrap();
//! assert!((spline.evaluate(7.5) - 56.25).abs() < 1e-9);
//! ```
use std::ops::RangeInclusive;

use nalgebra::{DMatrix, DVector, SVD};

use crate::{
    band::FilteredSpectrum,
    error::{Error, Result},
    knots::KnotPlan,
    value::Linspace,
};

/// Polynomial degree of every fitted spline.
pub const DEGREE: usize = 3;

/// Number of non-zero basis functions at any point.
const ORDER: usize = DEGREE + 1;

/// A clamped cubic B-spline.
#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    knots: Vec<f64>,
    coefficients: Vec<f64>,
}
impl BSpline {
    /// Fits a spline to a filtered spectrum using the planned interior knots.
    ///
    /// # Errors
    /// See [`BSpline::fit_points`].
    pub fn fit(spectrum: &FilteredSpectrum, plan: &KnotPlan) -> Result<Self> {
        Self::fit_points(spectrum.wavelengths(), spectrum.reflectance(), plan.knots())
    }

    /// Fits a spline to `(x, y)` samples with the given interior knots.
    ///
    /// # Errors
    /// - [`Error::LengthMismatch`] if `x` and `y` differ in length
    /// - [`Error::SplineFit`] if there are more coefficients than samples, the
    ///   samples or knots are not strictly increasing, a knot falls outside the
    ///   open sample range, the Schoenberg–Whitney conditions do not hold, or the
    ///   least-squares system cannot be solved
    pub fn fit_points(x: &[f64], y: &[f64], interior: &[f64]) -> Result<Self> {
        let samples = x.len();
        if y.len() != samples {
            return Err(Error::LengthMismatch {
                expected: samples,
                found: y.len(),
            });
        }

        let failed = |reason| Error::SplineFit {
            knots: interior.len(),
            samples,
            reason,
        };

        let n_coefs = interior.len() + ORDER;
        if samples < ORDER {
            return Err(failed("fewer samples than the spline order"));
        }
        if n_coefs > samples {
            return Err(failed("more coefficients than samples"));
        }
        if !strictly_increasing(x) {
            return Err(failed("sample positions are not strictly increasing"));
        }

        let (lo, hi) = (x[0], x[samples - 1]);
        if !strictly_increasing(interior) || interior.iter().any(|&k| k <= lo || k >= hi) {
            return Err(failed("interior knots are not increasing inside the sample range"));
        }

        let knots = clamped_knot_vector(lo, hi, interior);
        if !schoenberg_whitney(&knots, x, n_coefs) {
            return Err(failed("knots violate the Schoenberg-Whitney conditions"));
        }

        let design = design_matrix(&knots, x, n_coefs);
        let b = DVector::from_column_slice(y);
        let coefficients = solve_least_squares(design, &b).map_err(failed)?;

        Ok(Self {
            knots,
            coefficients,
        })
    }

    /// Polynomial degree, always [`DEGREE`].
    #[must_use]
    pub fn degree(&self) -> usize {
        DEGREE
    }

    /// The full knot vector, boundary knots included.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// The interior knots the spline was fitted with.
    #[must_use]
    pub fn interior_knots(&self) -> &[f64] {
        &self.knots[ORDER..self.knots.len() - ORDER]
    }

    /// One coefficient per basis function.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// The sample range the spline was fitted over.
    #[must_use]
    pub fn domain(&self) -> RangeInclusive<f64> {
        self.knots[DEGREE]..=self.knots[self.coefficients.len()]
    }

    /// Evaluates the spline at `x`.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let span = find_span(&self.knots, self.coefficients.len(), x);
        let basis = basis_functions(&self.knots, span, x);
        basis
            .iter()
            .zip(&self.coefficients[span - DEGREE..=span])
            .map(|(b, c)| b * c)
            .sum()
    }

    /// Evaluates the spline at every point of `xs`.
    #[must_use]
    pub fn evaluate_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Evaluates the spline on `n` evenly spaced points of `range`.
    #[must_use]
    pub fn resample(&self, range: RangeInclusive<f64>, n: usize) -> ResampledFit {
        let axis: Vec<f64> = Linspace::new(range, n).collect();
        let values = self.evaluate_all(&axis);
        ResampledFit { axis, values }
    }
}

/// A fitted spline evaluated on an evenly spaced grid.
///
/// The grid spans the filtered wavelength range with as many points as there
/// were filtered samples. Values are aligned with [`ResampledFit::axis`], not
/// with the original sample positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledFit {
    axis: Vec<f64>,
    values: Vec<f64>,
}
impl ResampledFit {
    /// Resampling grid.
    #[must_use]
    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    /// Spline values on the grid.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of grid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the grid is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The `(wavelength, value)` pairs.
    #[must_use]
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.axis
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }
}

/// Fits a spectrum with the planned knots and resamples the result.
///
/// The grid spans `[min, max]` of the filtered wavelengths with one point per
/// filtered sample.
///
/// # Errors
/// See [`BSpline::fit_points`].
pub fn fit_and_resample(
    spectrum: &FilteredSpectrum,
    plan: &KnotPlan,
) -> Result<(BSpline, ResampledFit)> {
    let spline = BSpline::fit(spectrum, plan)?;
    let wavelengths = spectrum.wavelengths();
    let range = wavelengths[0]..=wavelengths[wavelengths.len() - 1];
    let resampled = spline.resample(range, spectrum.len());
    Ok((spline, resampled))
}

fn strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

/// `[lo; ORDER] ++ interior ++ [hi; ORDER]`
fn clamped_knot_vector(lo: f64, hi: f64, interior: &[f64]) -> Vec<f64> {
    let mut knots = Vec::with_capacity(interior.len() + 2 * ORDER);
    knots.extend(std::iter::repeat(lo).take(ORDER));
    knots.extend_from_slice(interior);
    knots.extend(std::iter::repeat(hi).take(ORDER));
    knots
}

/// Checks that some strictly increasing subset of samples satisfies
/// `t[j] < x[i_j] < t[j + ORDER]` for every inner basis function.
///
/// Without this the least-squares system has no unique solution.
fn schoenberg_whitney(knots: &[f64], x: &[f64], n_coefs: usize) -> bool {
    let last = x.len() - 1;
    let mut i = 0;
    for j in 1..n_coefs.saturating_sub(1) {
        let (lo, hi) = (knots[j], knots[j + ORDER]);
        loop {
            i += 1;
            if i >= last {
                return false;
            }
            if x[i] > lo {
                break;
            }
        }
        if x[i] >= hi {
            return false;
        }
    }
    true
}

/// Index `s` of the knot span containing `x`, with `knots[s] <= x < knots[s + 1]`.
///
/// Clamped to the first and last non-empty spans, so points outside the knot
/// range use the boundary polynomial pieces.
fn find_span(knots: &[f64], n_coefs: usize, x: f64) -> usize {
    let last = n_coefs - 1;
    if x >= knots[n_coefs] {
        return last;
    }
    if x <= knots[DEGREE] {
        return DEGREE;
    }

    let at_or_below = knots[DEGREE..=n_coefs].partition_point(|&k| k <= x);
    (DEGREE + at_or_below - 1).min(last)
}

/// Values of the `ORDER` basis functions that are non-zero on `span`, at `x`.
///
/// Cox–de Boor recursion in its triangular form; entry `r` belongs to basis
/// function `span - DEGREE + r`.
fn basis_functions(knots: &[f64], span: usize, x: f64) -> [f64; ORDER] {
    let mut values = [0.0; ORDER];
    let mut left = [0.0; ORDER];
    let mut right = [0.0; ORDER];

    values[0] = 1.0;
    for j in 1..=DEGREE {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;

        let mut saved = 0.0;
        for r in 0..j {
            let temp = values[r] / (right[r + 1] + left[j - r]);
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }

    values
}

/// Turns the samples into a basis matrix, one row per sample.
fn design_matrix(knots: &[f64], x: &[f64], n_coefs: usize) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(x.len(), n_coefs);
    for (row, &xi) in x.iter().enumerate() {
        let span = find_span(knots, n_coefs, xi);
        let basis = basis_functions(knots, span, xi);
        for (r, value) in basis.into_iter().enumerate() {
            matrix[(row, span - DEGREE + r)] = value;
        }
    }
    matrix
}

fn solve_least_squares(
    design: DMatrix<f64>,
    b: &DVector<f64>,
) -> std::result::Result<Vec<f64>, &'static str> {
    let (rows, cols) = design.shape();

    // Calculate the singular value decomposition of the matrix
    let decomp = SVD::new(design, true, true);

    // ~= machine_epsilon * max(size) * max_singular
    let sigma_max = decomp.singular_values.max();
    let epsilon = f64::EPSILON * rows.max(cols) as f64 * sigma_max;
    if decomp.rank(epsilon) < cols {
        return Err("design matrix is rank deficient");
    }

    let solution = decomp.solve(b, epsilon)?;
    let coefficients: Vec<f64> = solution.iter().copied().collect();

    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err("non-finite coefficients");
    }

    Ok(coefficients)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{assert_all_close, assert_close};

    fn cubic(x: f64) -> f64 {
        let t = (x - 540.0) / 160.0;
        0.4 + 0.3 * t - 0.2 * t * t + 0.5 * t * t * t
    }

    fn axis(n: usize) -> Vec<f64> {
        Linspace::new(380.0..=700.0, n).collect()
    }

    #[test]
    fn basis_is_a_partition_of_unity() {
        let knots = clamped_knot_vector(0.0, 10.0, &[1.0, 2.5, 6.0, 9.0]);
        let n_coefs = 8;
        for x in Linspace::new(0.0..=10.0, 101) {
            let span = find_span(&knots, n_coefs, x);
            let sum: f64 = basis_functions(&knots, span, x).iter().sum();
            assert_close!(sum, 1.0, 1e-12, "x = {x}");
        }
    }

    #[test]
    fn spans_are_clamped_at_the_ends() {
        let knots = clamped_knot_vector(0.0, 10.0, &[2.0, 4.0, 6.0, 8.0]);
        assert_eq!(find_span(&knots, 8, -5.0), 3);
        assert_eq!(find_span(&knots, 8, 0.0), 3);
        assert_eq!(find_span(&knots, 8, 2.0), 4);
        assert_eq!(find_span(&knots, 8, 9.99), 7);
        assert_eq!(find_span(&knots, 8, 10.0), 7);
        assert_eq!(find_span(&knots, 8, 50.0), 7);
    }

    #[test]
    fn reproduces_a_cubic_exactly() {
        let x = axis(65);
        let y: Vec<f64> = x.iter().map(|&x| cubic(x)).collect();
        let plan = KnotPlan::new(&x, 9).unwrap();

        let spline = BSpline::fit_points(&x, &y, plan.knots()).unwrap();
        assert_eq!(spline.coefficients().len(), 13);
        assert_eq!(spline.knots().len(), 17);
        assert_eq!(spline.interior_knots(), plan.knots());

        for probe in [380.0, 401.3, 512.0, 650.5, 700.0] {
            assert_close!(spline.evaluate(probe), cubic(probe), 1e-9);
        }
    }

    #[test]
    fn interpolates_when_coefficients_match_samples() {
        let x = axis(8);
        let y = vec![0.1, 0.5, 0.2, 0.9, 0.4, 0.3, 0.8, 0.6];
        let plan = KnotPlan::new(&x, 4).unwrap();

        let spline = BSpline::fit_points(&x, &y, plan.knots()).unwrap();
        assert_all_close!(spline.evaluate_all(&x), y, 1e-9);
    }

    #[test]
    fn resample_spans_the_domain() {
        let x = axis(17);
        let y: Vec<f64> = x.iter().map(|&x| cubic(x)).collect();
        let spectrum = FilteredSpectrum::new(x.clone(), y).unwrap();
        let plan = KnotPlan::new(&x, 6).unwrap();

        let (spline, resampled) = fit_and_resample(&spectrum, &plan).unwrap();
        assert_eq!(spline.domain(), 380.0..=700.0);
        assert_eq!(resampled.len(), 17);
        assert_all_close!(resampled.axis(), x, 1e-9);
        assert_close!(resampled.values()[16], cubic(700.0), 1e-9);
    }

    #[test]
    fn extrapolates_with_boundary_pieces() {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|x| 2.0 * x - 1.0).collect();
        let spline = BSpline::fit_points(&x, &y, &[5.0, 10.0, 15.0, 20.0]).unwrap();

        assert_close!(spline.evaluate(-2.0), -5.0, 1e-9);
        assert_close!(spline.evaluate(31.0), 61.0, 1e-9);
    }

    #[test]
    fn too_many_coefficients() {
        let x = axis(17);
        let y: Vec<f64> = x.iter().map(|&x| cubic(x)).collect();
        let plan = KnotPlan::new(&x, 14).unwrap();

        let err = BSpline::fit_points(&x, &y, plan.knots()).unwrap_err();
        assert!(matches!(
            err,
            Error::SplineFit {
                knots: 14,
                samples: 17,
                reason: "more coefficients than samples"
            }
        ));
    }

    #[test]
    fn unordered_knots() {
        let x = axis(40);
        let y = vec![0.5; 40];
        let err = BSpline::fit_points(&x, &y, &[450.0, 420.0, 500.0, 600.0]).unwrap_err();
        assert!(matches!(err, Error::SplineFit { .. }));

        let err = BSpline::fit_points(&x, &y, &[380.0, 420.0, 500.0, 600.0]).unwrap_err();
        assert!(matches!(err, Error::SplineFit { .. }));
    }

    #[test]
    fn knots_without_supporting_samples() {
        let x: Vec<f64> = (0..11).map(f64::from).collect();
        let y = x.clone();
        let err = BSpline::fit_points(&x, &y, &[0.1, 0.2, 0.3, 0.4]).unwrap_err();
        assert!(matches!(
            err,
            Error::SplineFit {
                reason: "knots violate the Schoenberg-Whitney conditions",
                ..
            }
        ));
    }

    #[test]
    fn mismatched_lengths() {
        let err = BSpline::fit_points(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0], &[]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 4, found: 2 }));
    }
}
