//! Knot-count sweeps over spectra.
//!
//! For every spectrum of a dataset and every knot count of the configured
//! range, a [`SweepRunner`]:
//! 1. restricts the spectrum to the wavelength band ([`BandMask`]),
//! 2. places the interior knots ([`KnotPlan`]),
//! 3. fits and resamples a cubic B-spline ([`fit_and_resample`]),
//! 4. scores the fit ([`FitMetrics`]).
//!
//! Every attempted knot count produces exactly one [`FitRow`]. A knot count
//! that cannot be fitted becomes a failed row carrying a [`FailureTag`] and the
//! sweep moves on, so a [`ResultTable`] always has one row per knot count.
//!
//! ```rust
//! use knotfit::{
//!     dataset::Dataset,
//!     sink::MemorySink,
//!     plotting::NoRenderer,
//!     sweep::{KnotRange, SweepConfig, SweepRunner},
//!     test::{axis, linear_ramp, to_cells},
//! };
//!
//! let wavelengths = axis(380.0..=700.0, 20.0);
//! let ramp = to_cells(&linear_ramp(&wavelengths, 0.1, 0.001));
//! let dataset = Dataset::new("ramp", wavelengths, vec![ramp]).unwrap();
//!
//! let config = SweepConfig {
//!     knots: KnotRange::new(4, 8),
//!     ..SweepConfig::default()
//! };
//! let mut runner = SweepRunner::new(config, MemorySink::new(), NoRenderer);
//! let summary = runner.run_dataset(&dataset);
//!
//! assert_eq!(summary.rows, 5);
//! assert_eq!(runner.sink().tables()[0].rows()[0].knot_count, 4);
//! ```
use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    band::{BandMask, FilteredSpectrum, WavelengthBand},
    dataset::Dataset,
    error::{Error, FailureTag, Result},
    knots::KnotPlan,
    plotting::{DiagnosticFrame, DiagnosticRenderer},
    sink::ResultSink,
    spline::{fit_and_resample, ResampledFit},
    statistics::FitMetrics,
};

/// Inclusive range of knot counts to sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnotRange {
    /// First knot count
    pub start: usize,
    /// Last knot count (inclusive)
    pub end: usize,
    /// Increment between knot counts
    #[serde(default = "default_step")]
    pub step: usize,
}
impl KnotRange {
    /// `start..=end` in steps of one.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            step: default_step(),
        }
    }

    /// Iterates the knot counts in ascending order. A step of zero is treated as one.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        (self.start..=self.end).step_by(self.step.max(1))
    }

    /// Number of knot counts in the range.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the range holds no knot counts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}
impl Default for KnotRange {
    fn default() -> Self {
        Self::new(4, 24)
    }
}

fn default_step() -> usize {
    1
}

fn default_plots() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("visible-bspline-data")
}

/// Parameters of a sweep.
///
/// Every field has a default, so an empty JSON object is a valid configuration:
/// ```json
/// {
///     "band": { "min": 380.0, "max": 700.0 },
///     "knots": { "start": 4, "end": 24, "step": 1 },
///     "plots": true,
///     "output_dir": "visible-bspline-data"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Wavelength band spectra are restricted to
    #[serde(default)]
    pub band: WavelengthBand,

    /// Knot counts to fit
    #[serde(default)]
    pub knots: KnotRange,

    /// Whether successful fits are handed to the renderer
    #[serde(default = "default_plots")]
    pub plots: bool,

    /// Root directory for result tables and plots
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}
impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            band: WavelengthBand::default(),
            knots: KnotRange::default(),
            plots: default_plots(),
            output_dir: default_output_dir(),
        }
    }
}
impl SweepConfig {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the text is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&text)
    }
}

/// Outcome of one knot count.
///
/// Failed rows carry NaN for every undefined metric. When only R² is undefined
/// (zero-variance spectrum), MSE and RMSE are kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitRow {
    /// Number of interior knots attempted
    pub knot_count: usize,
    /// Mean squared error, or NaN
    pub mse: f64,
    /// Root mean squared error, or NaN
    pub rmse: f64,
    /// Coefficient of determination, or NaN
    pub r_squared: f64,
    /// Why the fit failed, if it did
    pub failure: Option<FailureTag>,
}
impl FitRow {
    /// A failed row with every metric undefined.
    #[must_use]
    pub fn failed(knot_count: usize, tag: FailureTag) -> Self {
        Self {
            knot_count,
            mse: f64::NAN,
            rmse: f64::NAN,
            r_squared: f64::NAN,
            failure: Some(tag),
        }
    }

    /// A failed row for `error`, keeping whatever metrics the error still carries.
    #[must_use]
    pub fn from_error(knot_count: usize, error: &Error) -> Self {
        match *error {
            Error::UndefinedRSquared { mse } => Self {
                mse,
                rmse: mse.sqrt(),
                ..Self::failed(knot_count, FailureTag::UndefinedRSquared)
            },
            _ => Self::failed(knot_count, FailureTag::from(error)),
        }
    }

    /// Whether the fit succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }

    /// The metrics of a successful fit.
    #[must_use]
    pub fn metrics(&self) -> Option<FitMetrics> {
        self.is_ok().then_some(FitMetrics {
            knot_count: self.knot_count,
            mse: self.mse,
            rmse: self.rmse,
            r_squared: self.r_squared,
        })
    }
}
impl From<FitMetrics> for FitRow {
    fn from(metrics: FitMetrics) -> Self {
        Self {
            knot_count: metrics.knot_count,
            mse: metrics.mse,
            rmse: metrics.rmse,
            r_squared: metrics.r_squared,
            failure: None,
        }
    }
}

/// All rows of one spectrum, in ascending knot count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    dataset: String,
    spectrum_index: usize,
    rows: Vec<FitRow>,
}
impl ResultTable {
    /// Creates a table.
    pub fn new(dataset: impl Into<String>, spectrum_index: usize, rows: Vec<FitRow>) -> Self {
        Self {
            dataset: dataset.into(),
            spectrum_index,
            rows,
        }
    }

    /// Name of the dataset the spectrum came from.
    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Position of the spectrum in its dataset.
    #[must_use]
    pub fn spectrum_index(&self) -> usize {
        self.spectrum_index
    }

    /// One row per attempted knot count.
    #[must_use]
    pub fn rows(&self) -> &[FitRow] {
        &self.rows
    }

    /// Number of failed rows.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_ok()).count()
    }

    /// The successful row with the lowest MSE.
    #[must_use]
    pub fn best(&self) -> Option<&FitRow> {
        self.rows
            .iter()
            .filter(|r| r.is_ok())
            .min_by(|a, b| a.mse.total_cmp(&b.mse))
    }
}

/// Counters for a batch of spectra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Spectra processed
    pub spectra: usize,
    /// Spectra that could not be filtered to the band
    pub skipped_spectra: usize,
    /// Rows produced
    pub rows: usize,
    /// Rows with a failure tag
    pub failed_rows: usize,
    /// Tables the sink failed to store
    pub sink_failures: usize,
}
impl BatchSummary {
    fn record(&mut self, table: &ResultTable) {
        self.spectra += 1;
        self.rows += table.rows().len();
        self.failed_rows += table.failures();
    }

    /// Adds the counters of another batch.
    pub fn merge(&mut self, other: &Self) {
        self.spectra += other.spectra;
        self.skipped_spectra += other.skipped_spectra;
        self.rows += other.rows;
        self.failed_rows += other.failed_rows;
        self.sink_failures += other.sink_failures;
    }
}
impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} spectra ({} skipped), {} rows ({} failed), {} sink failures",
            self.spectra, self.skipped_spectra, self.rows, self.failed_rows, self.sink_failures
        )
    }
}

/// Plans knots, fits and resamples one spectrum with `knot_count` interior knots.
///
/// # Errors
/// - [`Error::DegenerateKnotPlan`] if the knots cannot be placed
/// - [`Error::SplineFit`] if the spline cannot be fitted
pub fn resampled_fit(spectrum: &FilteredSpectrum, knot_count: usize) -> Result<ResampledFit> {
    let plan = KnotPlan::new(spectrum.wavelengths(), knot_count)?;
    let (_, resampled) = fit_and_resample(spectrum, &plan)?;
    Ok(resampled)
}

/// Fits and scores one spectrum with `knot_count` interior knots.
///
/// # Errors
/// See [`resampled_fit`] and [`FitMetrics::evaluate`].
pub fn fit_once(spectrum: &FilteredSpectrum, knot_count: usize) -> Result<FitMetrics> {
    let fit = resampled_fit(spectrum, knot_count)?;
    FitMetrics::evaluate(knot_count, spectrum.reflectance(), fit.values())
}

/// Runs knot sweeps and hands the results to a sink and a renderer.
///
/// Spectra are processed one at a time. Each table is written as soon as its
/// sweep finishes.
#[derive(Debug)]
pub struct SweepRunner<S, R> {
    config: SweepConfig,
    sink: S,
    renderer: R,
}
impl<S: ResultSink, R: DiagnosticRenderer> SweepRunner<S, R> {
    /// Creates a runner.
    pub fn new(config: SweepConfig, sink: S, renderer: R) -> Self {
        Self {
            config,
            sink,
            renderer,
        }
    }

    /// The sweep configuration.
    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// The result sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the runner, returning its sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Sweeps every configured knot count over one filtered spectrum.
    ///
    /// Never fails: knot counts that cannot be fitted become failed rows.
    pub fn sweep_spectrum(
        &mut self,
        dataset: &str,
        spectrum_index: usize,
        spectrum: &FilteredSpectrum,
    ) -> ResultTable {
        let knots = self.config.knots;
        let rows = knots
            .iter()
            .map(|knot_count| self.attempt(dataset, spectrum_index, spectrum, knot_count))
            .collect();
        ResultTable::new(dataset, spectrum_index, rows)
    }

    /// A table where every configured knot count failed with `error`.
    #[must_use]
    pub fn failed_table(&self, dataset: &str, spectrum_index: usize, error: &Error) -> ResultTable {
        let rows = self
            .config
            .knots
            .iter()
            .map(|knot_count| FitRow::from_error(knot_count, error))
            .collect();
        ResultTable::new(dataset, spectrum_index, rows)
    }

    /// Sweeps every spectrum of a dataset and writes one table per spectrum.
    ///
    /// Spectra that cannot be filtered to the band produce a table of failed
    /// rows. Sink failures are logged and counted, never fatal.
    pub fn run_dataset(&mut self, dataset: &Dataset) -> BatchSummary {
        let name = dataset.name();
        let mask = BandMask::new(dataset.axis(), self.config.band);
        log::info!(
            "Dataset `{name}`: {} spectra, {} of {} wavelengths in {}-{} nm",
            dataset.len(),
            mask.count(),
            mask.len(),
            self.config.band.min,
            self.config.band.max
        );

        let mut summary = BatchSummary::default();
        for (index, cells) in dataset.rows().iter().enumerate() {
            log::info!("Processing spectrum {}/{} of `{name}`", index + 1, dataset.len());

            let table = match mask.filter_spectrum(dataset.axis(), cells) {
                Ok(spectrum) => self.sweep_spectrum(name, index, &spectrum),
                Err(e) => {
                    log::warn!("Spectrum {index} of `{name}` cannot be fitted: {e}");
                    summary.skipped_spectra += 1;
                    self.failed_table(name, index, &e)
                }
            };

            summary.record(&table);
            if let Err(e) = self.sink.write_table(&table) {
                log::error!("Failed to store results of spectrum {index} of `{name}`: {e}");
                summary.sink_failures += 1;
            }
        }

        log::info!("Finished `{name}`: {summary}");
        summary
    }

    fn attempt(
        &mut self,
        dataset: &str,
        spectrum_index: usize,
        spectrum: &FilteredSpectrum,
        knot_count: usize,
    ) -> FitRow {
        let fit = match resampled_fit(spectrum, knot_count) {
            Ok(fit) => fit,
            Err(e) => {
                log::warn!("{dataset} #{spectrum_index}: {knot_count} knots failed: {e}");
                return FitRow::from_error(knot_count, &e);
            }
        };

        let row = match FitMetrics::evaluate(knot_count, spectrum.reflectance(), fit.values()) {
            Ok(metrics) => {
                log::debug!(
                    "{dataset} #{spectrum_index}: {knot_count} knots, MSE = {:.3e}, R² = {:.5}",
                    metrics.mse,
                    metrics.r_squared
                );
                FitRow::from(metrics)
            }
            Err(e) => {
                log::warn!("{dataset} #{spectrum_index}: {knot_count} knots: {e}");
                FitRow::from_error(knot_count, &e)
            }
        };

        if self.config.plots {
            let frame = DiagnosticFrame {
                dataset,
                spectrum_index,
                row,
                spectrum,
                fit: &fit,
            };
            if let Err(e) = self.renderer.render(&frame) {
                log::warn!("{dataset} #{spectrum_index}: plot for {knot_count} knots skipped: {e}");
            }
        }

        row
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{
        assert_close,
        dataset::Cell,
        plotting::NoRenderer,
        sink::MemorySink,
        test::{absorption_bands, apply_noise, axis, linear_ramp, polynomial, to_cells},
    };

    fn runner(knots: KnotRange) -> SweepRunner<MemorySink, NoRenderer> {
        let config = SweepConfig {
            knots,
            ..SweepConfig::default()
        };
        SweepRunner::new(config, MemorySink::new(), NoRenderer)
    }

    fn ramp() -> FilteredSpectrum {
        let wavelengths = axis(380.0..=700.0, 20.0);
        let reflectance = linear_ramp(&wavelengths, 0.1, 0.001);
        FilteredSpectrum::new(wavelengths, reflectance).unwrap()
    }

    fn leaf(wavelengths: &[f64]) -> Vec<f64> {
        absorption_bands(wavelengths, 0.45, &[(480.0, 30.0, 0.2), (680.0, 20.0, 0.3)])
    }

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<(usize, usize, Option<FailureTag>)>,
        fail: bool,
    }
    impl DiagnosticRenderer for RecordingRenderer {
        fn render(&mut self, frame: &DiagnosticFrame<'_>) -> Result<()> {
            self.frames
                .push((frame.spectrum_index, frame.row.knot_count, frame.row.failure));
            if self.fail {
                return Err(Error::Render("no canvas".to_string()));
            }
            Ok(())
        }
    }

    struct BrokenSink;
    impl ResultSink for BrokenSink {
        fn write_table(&mut self, _: &ResultTable) -> Result<()> {
            Err(Error::io("out", std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn linear_ramp_is_fitted_at_every_knot_count() {
        let spectrum = ramp();

        let table = runner(KnotRange::new(4, 8)).sweep_spectrum("ramp", 0, &spectrum);
        let counts: Vec<usize> = table.rows().iter().map(|r| r.knot_count).collect();
        assert_eq!(counts, vec![4, 5, 6, 7, 8]);

        for row in table.rows() {
            assert!(row.is_ok(), "{row:?}");
            assert!(row.rmse < 0.01, "{row:?}");
            assert!(row.r_squared > 0.99, "{row:?}");
        }
    }

    #[test]
    fn exact_cubic_is_reproduced_for_every_valid_knot_count() {
        let wavelengths = axis(380.0..=700.0, 5.0);
        let reflectance = polynomial(&wavelengths, &[0.2, 0.5, -0.9, 0.6]);
        let spectrum = FilteredSpectrum::new(wavelengths, reflectance).unwrap();

        let table = runner(KnotRange::default()).sweep_spectrum("cubic", 0, &spectrum);
        assert_eq!(table.rows().len(), 21);
        for row in table.rows() {
            assert!(row.mse < 1e-20, "{row:?}");
            assert!((row.r_squared - 1.0).abs() < 1e-9, "{row:?}");
        }
    }

    #[test]
    fn constant_spectrum_has_undefined_r_squared() {
        let wavelengths = axis(380.0..=700.0, 20.0);
        let spectrum = FilteredSpectrum::new(wavelengths, vec![0.25; 17]).unwrap();

        let table = runner(KnotRange::new(4, 8)).sweep_spectrum("flat", 0, &spectrum);
        assert_eq!(table.rows().len(), 5);
        for row in table.rows() {
            assert_eq!(row.failure, Some(FailureTag::UndefinedRSquared));
            assert!(row.mse.is_finite() && row.mse < 1e-20);
            assert!(row.rmse.is_finite());
            assert!(row.r_squared.is_nan());
            assert!(row.metrics().is_none());
        }
    }

    #[test]
    fn failed_knot_counts_do_not_stop_the_sweep() {
        let wavelengths = axis(380.0..=700.0, 20.0);
        let reflectance = linear_ramp(&wavelengths, 0.3, -0.0004);
        let spectrum = FilteredSpectrum::new(wavelengths, reflectance).unwrap();

        let table = runner(KnotRange::new(12, 17)).sweep_spectrum("ramp", 0, &spectrum);
        let tags: Vec<Option<FailureTag>> = table.rows().iter().map(|r| r.failure).collect();
        assert_eq!(
            tags,
            vec![
                None,
                None,
                Some(FailureTag::SplineFit),
                Some(FailureTag::SplineFit),
                Some(FailureTag::DegenerateKnotPlan),
                Some(FailureTag::DegenerateKnotPlan),
            ]
        );
        assert_eq!(table.failures(), 4);
        assert!(table.rows()[2].mse.is_nan());
    }

    #[test]
    fn missing_value_outside_band_keeps_the_full_sweep() {
        let wavelengths = axis(350.0..=750.0, 5.0);
        let mut cells = to_cells(&leaf(&wavelengths));
        cells[0] = Cell::Missing;
        cells[80] = Cell::parse("n/a");
        let dataset = Dataset::new("leaves", wavelengths, vec![cells]).unwrap();

        let mut runner = runner(KnotRange::default());
        let summary = runner.run_dataset(&dataset);
        assert_eq!(summary.spectra, 1);
        assert_eq!(summary.skipped_spectra, 0);
        assert_eq!(summary.rows, 21);

        let table = &runner.sink().tables()[0];
        assert_eq!(table.rows().len(), 21);
        assert_eq!(table.rows()[0].knot_count, 4);
        assert_eq!(table.rows()[20].knot_count, 24);
        assert!(table.rows().iter().all(FitRow::is_ok));
    }

    #[test]
    fn missing_value_inside_band_fails_every_row() {
        let wavelengths = axis(380.0..=700.0, 10.0);
        let good = to_cells(&leaf(&wavelengths));
        let mut bad = good.clone();
        bad[5] = Cell::Missing;
        let dataset = Dataset::new("leaves", wavelengths, vec![bad, good]).unwrap();

        let mut runner = runner(KnotRange::new(4, 10));
        let summary = runner.run_dataset(&dataset);
        assert_eq!(summary.spectra, 2);
        assert_eq!(summary.skipped_spectra, 1);
        assert_eq!(summary.failed_rows, 7);

        let tables = runner.into_sink().into_tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows().len(), 7);
        assert!(tables[0]
            .rows()
            .iter()
            .all(|r| r.failure == Some(FailureTag::MissingSample)));
        assert_eq!(tables[1].failures(), 0);
    }

    #[test]
    fn error_shrinks_as_knots_are_added() {
        // Expected trend on smooth data, not a guarantee for every consecutive pair
        let wavelengths = axis(380.0..=700.0, 1.0);
        let reflectance = leaf(&wavelengths);
        let spectrum = FilteredSpectrum::new(wavelengths, reflectance).unwrap();

        let coarse = fit_once(&spectrum, 4).unwrap();
        let medium = fit_once(&spectrum, 12).unwrap();
        let fine = fit_once(&spectrum, 24).unwrap();

        assert!(medium.mse < coarse.mse, "{medium:?} vs {coarse:?}");
        assert!(fine.mse < medium.mse, "{fine:?} vs {medium:?}");
        assert!(fine.r_squared > 0.999, "{fine:?}");
    }

    #[test]
    fn noisy_spectrum_keeps_r_squared_bounded() {
        let wavelengths = axis(380.0..=700.0, 1.0);
        let noisy = apply_noise(&leaf(&wavelengths), 0.005, 11);
        let spectrum = FilteredSpectrum::new(wavelengths, noisy).unwrap();

        let table = runner(KnotRange::default()).sweep_spectrum("noisy", 0, &spectrum);
        for row in table.rows() {
            assert!(row.is_ok(), "{row:?}");
            assert!(row.mse >= 0.0 && row.rmse >= 0.0);
            assert!(row.r_squared <= 1.0);
        }
        assert!(table.best().is_some());
    }

    #[test]
    fn renderer_sees_fitted_rows_only_when_enabled() {
        let spectrum = ramp();

        let config = SweepConfig {
            knots: KnotRange::new(12, 16),
            ..SweepConfig::default()
        };
        let renderer = RecordingRenderer::default();
        let mut runner = SweepRunner::new(config.clone(), MemorySink::new(), renderer);
        runner.sweep_spectrum("ramp", 4, &spectrum);
        let counts: Vec<usize> = runner.renderer.frames.iter().map(|f| f.1).collect();
        assert_eq!(counts, vec![12, 13]);

        let config = SweepConfig { plots: false, ..config };
        let mut runner = SweepRunner::new(config, MemorySink::new(), RecordingRenderer::default());
        runner.sweep_spectrum("ramp", 4, &spectrum);
        assert!(runner.renderer.frames.is_empty());
    }

    #[test]
    fn renderer_failures_are_ignored() {
        let spectrum = ramp();

        let renderer = RecordingRenderer {
            fail: true,
            ..RecordingRenderer::default()
        };
        let config = SweepConfig {
            knots: KnotRange::new(4, 6),
            ..SweepConfig::default()
        };
        let mut runner = SweepRunner::new(config, MemorySink::new(), renderer);
        let table = runner.sweep_spectrum("ramp", 0, &spectrum);
        assert_eq!(table.failures(), 0);
        assert_eq!(runner.renderer.frames.len(), 3);
    }

    #[test]
    fn sink_failures_are_counted() {
        let wavelengths = axis(380.0..=700.0, 20.0);
        let rows = vec![to_cells(&linear_ramp(&wavelengths, 0.1, 0.001)); 3];
        let dataset = Dataset::new("ramp", wavelengths, rows).unwrap();

        let config = SweepConfig {
            knots: KnotRange::new(4, 5),
            ..SweepConfig::default()
        };
        let summary = SweepRunner::new(config, BrokenSink, NoRenderer).run_dataset(&dataset);
        assert_eq!(summary.spectra, 3);
        assert_eq!(summary.sink_failures, 3);
        assert_eq!(summary.rows, 6);
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let json = r#"{ "knots": { "start": 5, "end": 10 } }"#;
        let config = SweepConfig::from_json_str(json).unwrap();
        assert_eq!(config.knots, KnotRange::new(5, 10));
        assert_eq!(config.band, WavelengthBand::VISIBLE);
        assert!(config.plots);
        assert_eq!(config.output_dir, PathBuf::from("visible-bspline-data"));

        assert_eq!(SweepConfig::from_json_str("{}").unwrap(), SweepConfig::default());
        assert!(matches!(SweepConfig::from_json_str("{ \"plots\": 3 }"), Err(Error::Config(_))));
    }

    #[test]
    fn knot_ranges() {
        assert_eq!(KnotRange::default().len(), 21);
        let stepped = KnotRange { start: 4, end: 24, step: 5 };
        assert_eq!(stepped.iter().collect::<Vec<_>>(), vec![4, 9, 14, 19, 24]);
        assert!(KnotRange::new(8, 4).is_empty());
        assert_eq!(KnotRange::new(8, 4).len(), 0);
    }

    #[test]
    fn undefined_r_squared_rows_keep_mse() {
        let row = FitRow::from_error(7, &Error::UndefinedRSquared { mse: 0.04 });
        assert_eq!(row.mse, 0.04);
        assert_close!(row.rmse, 0.2);
        assert!(row.r_squared.is_nan());

        let row = FitRow::from_error(7, &Error::InsufficientBand { found: 2, required: 4 });
        assert_eq!(row.failure, Some(FailureTag::InsufficientBand));
        assert!(row.mse.is_nan());
    }
}
