//! Interior knot placement.
//!
//! Knots are placed by evenly spacing sample *indices*, not wavelength values,
//! so knot density follows sample density on non-uniform axes. The first and
//! last samples are never used as interior knots.
//!
//! <div class="warning">
//!
//! **Technical Details**
//!
//! ```math
//! index_i = round(1 + i · (L - 3) / (K - 1)),   i = 0 .. K-1
//! knot_i  = axis[index_i]
//! where
//!   L = number of filtered samples, K = requested knot count
//! ```
//! </div>
//!
//! Two positions rounding onto the same index would produce a repeated knot,
//! which corrupts the fit; that is reported as [`Error::DegenerateKnotPlan`]
//! rather than deduplicated.
use crate::{
    band::MIN_SAMPLES,
    error::{Error, Result},
    spline::DEGREE,
    value::nearest_index,
};

/// Fewest interior knots a plan may request.
pub const MIN_KNOTS: usize = DEGREE + 1;

/// Strictly increasing interior knot wavelengths.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotPlan {
    indices: Vec<usize>,
    knots: Vec<f64>,
}
impl KnotPlan {
    /// Plans `count` interior knots on a filtered wavelength axis.
    ///
    /// # Errors
    /// - [`Error::InsufficientBand`] if the axis has fewer than [`MIN_SAMPLES`] samples
    /// - [`Error::DegenerateKnotPlan`] if `count < MIN_KNOTS`, `count >= axis.len()`,
    ///   two knots round onto one index, or the chosen wavelengths are not
    ///   strictly increasing inside the axis
    ///
    /// # Example
    /// ```
    /// # use knotfit::knots::KnotPlan;
    /// let axis: Vec<f64> = (0..17).map(|i| 380.0 + 20.0 * f64::from(i)).collect();
    /// let plan = KnotPlan::new(&axis, 4).unwrap();
    /// assert_eq!(plan.indices(), &[1, 6, 10, 15]);
    /// ```
    pub fn new(axis: &[f64], count: usize) -> Result<Self> {
        let samples = axis.len();
        if samples < MIN_SAMPLES {
            return Err(Error::InsufficientBand {
                found: samples,
                required: MIN_SAMPLES,
            });
        }

        let degenerate = |reason| Error::DegenerateKnotPlan {
            knots: count,
            samples,
            reason,
        };

        if count < MIN_KNOTS {
            return Err(degenerate("knot count is below the minimum of 4"));
        }
        if count >= samples {
            return Err(degenerate("knot count must be smaller than the sample count"));
        }

        //
        // Evenly spaced positions over [1, L-2]
        let first = 1.0;
        let span = (samples - 3) as f64;
        let gaps = (count - 1) as f64;

        let mut indices = Vec::with_capacity(count);
        for i in 0..count {
            let position = first + span * i as f64 / gaps;
            let index = nearest_index(position)
                .ok_or_else(|| degenerate("knot position out of range"))?;

            if indices.last().is_some_and(|&prev| index <= prev) {
                return Err(degenerate("two knots round onto the same sample index"));
            }
            indices.push(index);
        }

        let knots: Vec<f64> = indices.iter().map(|&i| axis[i]).collect();

        //
        // Index monotonicity only implies strictly increasing knots on a strictly increasing axis
        let (lo, hi) = (axis[0], axis[samples - 1]);
        let increasing = knots.windows(2).all(|w| w[0] < w[1]);
        let interior = knots.iter().all(|&k| k > lo && k < hi);
        if !increasing || !interior {
            return Err(degenerate("knot wavelengths are not strictly increasing inside the axis"));
        }

        Ok(Self { indices, knots })
    }

    /// Knot wavelengths.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Sample indices the knots were taken from.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of interior knots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    /// Always false for a successfully planned set of knots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Linspace;

    fn uniform_axis(n: usize) -> Vec<f64> {
        Linspace::new(380.0..=700.0, n).collect()
    }

    #[test]
    fn plans_exact_count_strictly_inside() {
        for samples in [5, 8, 17, 33, 65, 321] {
            let axis = uniform_axis(samples);
            for count in MIN_KNOTS..=samples - 2 {
                let plan = KnotPlan::new(&axis, count).unwrap();
                assert_eq!(plan.len(), count, "L={samples} K={count}");
                assert!(plan.knots().windows(2).all(|w| w[0] < w[1]));
                assert!(plan.knots().iter().all(|&k| k > axis[0] && k < axis[samples - 1]));
            }
        }
    }

    #[test]
    fn endpoints_are_second_and_second_to_last() {
        let axis = uniform_axis(17);
        let plan = KnotPlan::new(&axis, 8).unwrap();
        assert_eq!(plan.indices(), &[1, 3, 5, 7, 9, 11, 13, 15]);
    }

    #[test]
    fn follows_sample_density_on_uneven_axis() {
        // Dense below 500 nm, sparse above
        let mut axis: Vec<f64> = (0..40).map(|i| 380.0 + 3.0 * f64::from(i)).collect();
        axis.extend((0..10).map(|i| 500.0 + 20.0 * f64::from(i)));

        let plan = KnotPlan::new(&axis, 10).unwrap();
        let below = plan.knots().iter().filter(|&&k| k < 500.0).count();
        assert!(below > 5, "{:?}", plan.knots());
    }

    #[test]
    fn too_few_knots() {
        let axis = uniform_axis(17);
        let err = KnotPlan::new(&axis, 3).unwrap_err();
        assert!(matches!(err, Error::DegenerateKnotPlan { knots: 3, .. }));
    }

    #[test]
    fn too_many_knots() {
        let axis = uniform_axis(17);
        let err = KnotPlan::new(&axis, 17).unwrap_err();
        assert!(matches!(err, Error::DegenerateKnotPlan { knots: 17, samples: 17, .. }));
    }

    #[test]
    fn colliding_indices_are_reported() {
        // 15 interior indices are available, so 16 knots must collide
        let axis = uniform_axis(17);
        let err = KnotPlan::new(&axis, 16).unwrap_err();
        assert!(matches!(
            err,
            Error::DegenerateKnotPlan {
                reason: "two knots round onto the same sample index",
                ..
            }
        ));
    }

    #[test]
    fn short_axis() {
        let err = KnotPlan::new(&[400.0, 500.0, 600.0], 4).unwrap_err();
        assert!(matches!(err, Error::InsufficientBand { found: 3, .. }));
    }
}
