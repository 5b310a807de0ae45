//! # Knotfit
//! ## How many knots does a reflectance spectrum need?
//!
//! A cubic B-spline with more interior knots follows a spectrum more closely, but every knot is a
//! parameter. This library sweeps the knot count over each spectrum of a dataset, fits a
//! least-squares cubic spline for every count and records how good each fit is, so you can pick
//! the smallest knot count that is good enough.
//!
//! For every spectrum and every knot count `K` the pipeline:
//! - Restricts the spectrum to a wavelength band, the visible 380-700 nm by default ([`band`])
//! - Places `K` interior knots on evenly spaced sample indices ([`knots`])
//! - Fits a clamped cubic B-spline by least squares and resamples it ([`spline`])
//! - Scores the fit with MSE, RMSE and R² ([`statistics`])
//!
//! The results are one table per spectrum ([`sweep::ResultTable`]), written to CSV by
//! [`sink::CsvSink`], plus an optional diagnostic plot per fit (`plotting` feature).
//!
//! ```rust
//! use knotfit::{band::{BandMask, WavelengthBand}, sweep::fit_once, test::{axis, polynomial}};
//!
//! let wavelengths = axis(350.0..=2500.0, 1.0);
//! let reflectance = polynomial(&wavelengths, &[0.05, 0.9, -0.4]);
//!
//! let mask = BandMask::new(&wavelengths, WavelengthBand::VISIBLE);
//! let spectrum = mask
//!     .filter_spectrum(&wavelengths, &knotfit::test::to_cells(&reflectance))
//!     .unwrap();
//! assert_eq!(spectrum.len(), 321);
//!
//! let metrics = fit_once(&spectrum, 8).unwrap();
//! assert!(metrics.r_squared > 0.999);
//! ```
//!
//! # Core Concepts
//! - A [`dataset::Dataset`] is a set of spectra sharing one wavelength axis.
//!     - Non-numeric values are kept as [`dataset::Cell::Missing`] and only matter inside the band.
//! - A [`knots::KnotPlan`] is the set of interior knots for one knot count.
//!     - It fails loudly when knots would collide, instead of silently dropping them.
//! - A [`spline::BSpline`] is the fitted curve; it is always cubic and never smoothed.
//! - A [`sweep::FitRow`] is one line of results. Knot counts that cannot be fitted still get a
//!   row, marked with a [`error::FailureTag`].
//!
//! # Implementation Details
//!
//! This crate makes use of the `nalgebra` library for the least-squares solve, `csv` for
//! reading catalog exports and writing results, and the `log` facade for progress reporting.
//!
//! # Testing utilities
//!
//! Assertion macros and synthetic spectra for tests live in [`test`].
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::needless_range_loop)] // The worst clippy lint
#![allow(clippy::cast_precision_loss)] // I don't care about this one
#![allow(clippy::similar_names)] //       Clippy does not get to decide what names are similar
#![cfg_attr(docsrs, feature(doc_cfg))]


pub mod band;
pub mod dataset;
pub mod error;
pub mod knots;
pub mod plotting;
pub mod sink;
pub mod spline;
pub mod statistics;
pub mod sweep;
pub mod value;

pub use error::{Error, FailureTag, Result};
pub use sweep::{SweepConfig, SweepRunner};

pub use nalgebra;
