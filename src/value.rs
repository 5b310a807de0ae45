//! Axis generation and coordinate utilities.
//!
//! # Iterators
//!
//! - [`Linspace`]: `n` evenly spaced values over a closed interval, the
//!   resampling grid used for evaluating fitted splines.
//!
//! # Traits
//!
//! - [`CoordExt`]: accessors for sequences of `(x, y)` points.
//!
//! # Example
//!
//! ```rust
//! use knotfit::value::Linspace;
//!
//! let grid: Vec<f64> = Linspace::new(380.0..=700.0, 17).collect();
//! assert_eq!(grid.len(), 17);
//! assert_eq!(grid[1], 400.0);
//! ```
use std::ops::{Range, RangeInclusive};

/// Iterator over `n` evenly spaced values covering a closed range.
///
/// The first value is exactly `range.start()` and the last exactly `range.end()`.
/// With `n == 1` only the start is produced.
#[derive(Debug, Clone)]
pub struct Linspace {
    start: f64,
    end: f64,
    n: usize,
    index: usize,
}
impl Linspace {
    /// Creates a new iterator over `n` points of the given range
    #[must_use]
    pub fn new(range: RangeInclusive<f64>, n: usize) -> Self {
        Self {
            start: *range.start(),
            end: *range.end(),
            n,
            index: 0,
        }
    }

    /// Returns the spacing between consecutive points
    #[must_use]
    pub fn step(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        (self.end - self.start) / (self.n - 1) as f64
    }
}
impl Iterator for Linspace {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.n {
            return None;
        }

        let i = self.index;
        self.index += 1;

        // Pin the last point so rounding never drifts past the end
        if i + 1 == self.n && self.n > 1 {
            Some(self.end)
        } else {
            Some(self.start + self.step() * i as f64)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n - self.index;
        (remaining, Some(remaining))
    }
}
impl ExactSizeIterator for Linspace {}

/// Rounds a non-negative position to the nearest index.
///
/// Returns `None` for negative, NaN or out-of-range positions.
#[must_use]
pub fn nearest_index(position: f64) -> Option<usize> {
    num_traits::cast(position.round())
}

/// Extension trait for accessing the `x` and `y` coordinates of a sequence of points.
///
/// # Examples
///
/// ```
/// # use knotfit::value::CoordExt;
/// let data = vec![(1.5, -2.0), (2.0, 3.0), (0.0, 1.0)];
/// assert_eq!(data.y(), vec![-2.0, 3.0, 1.0]);
/// assert_eq!(data.x_range(), Some(0.0..2.0));
/// ```
pub trait CoordExt {
    /// Returns an iterator over the x-coordinates.
    fn x_iter(&self) -> impl Iterator<Item = f64>;

    /// Returns an iterator over the y-coordinates.
    fn y_iter(&self) -> impl Iterator<Item = f64>;

    /// Returns the x-coordinates.
    fn x(&self) -> Vec<f64> {
        self.x_iter().collect()
    }

    /// Returns the y-coordinates.
    fn y(&self) -> Vec<f64> {
        self.y_iter().collect()
    }

    /// Returns the range of x-coordinates, ignoring NaN.
    fn x_range(&self) -> Option<Range<f64>> {
        min_max(self.x_iter())
    }

    /// Returns the range of y-coordinates, ignoring NaN.
    fn y_range(&self) -> Option<Range<f64>> {
        min_max(self.y_iter())
    }
}
impl CoordExt for Vec<(f64, f64)> {
    fn x_iter(&self) -> impl Iterator<Item = f64> {
        self.iter().map(|(x, _)| *x)
    }

    fn y_iter(&self) -> impl Iterator<Item = f64> {
        self.iter().map(|(_, y)| *y)
    }
}
impl CoordExt for &[(f64, f64)] {
    fn x_iter(&self) -> impl Iterator<Item = f64> {
        self.iter().map(|(x, _)| *x)
    }

    fn y_iter(&self) -> impl Iterator<Item = f64> {
        self.iter().map(|(_, y)| *y)
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    values
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<(f64, f64)>, v| {
            Some(match acc {
                Some((min, max)) => (min.min(v), max.max(v)),
                None => (v, v),
            })
        })
        .map(|(start, end)| start..end)
}
