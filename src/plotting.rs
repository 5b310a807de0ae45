//! Diagnostic plots of individual fits.
//!
//! A sweep hands every successful fit to a [`DiagnosticRenderer`] as a
//! [`DiagnosticFrame`]. Rendering is best-effort: a failing renderer is logged
//! and never changes the numeric results.
//!
//! - [`NoRenderer`] discards every frame.
//! - `PlottersRenderer` (feature `plotting`) draws the original spectrum and the
//!   fitted spline into `<root>/<dataset>/<index>/knots-<K>-vs.png`.
use crate::{band::FilteredSpectrum, error::Result, spline::ResampledFit, sweep::FitRow};

#[cfg(feature = "plotting")]
#[cfg_attr(docsrs, doc(cfg(feature = "plotting")))]
mod bitmap;

#[cfg(feature = "plotting")]
#[cfg_attr(docsrs, doc(cfg(feature = "plotting")))]
pub use bitmap::PlottersRenderer;

/// Everything needed to draw one fit.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticFrame<'a> {
    /// Dataset the spectrum belongs to
    pub dataset: &'a str,
    /// Position of the spectrum in its dataset
    pub spectrum_index: usize,
    /// The row recorded for this fit
    pub row: FitRow,
    /// Filtered samples the spline was fitted to
    pub spectrum: &'a FilteredSpectrum,
    /// The fitted spline on its resampling grid
    pub fit: &'a ResampledFit,
}
impl DiagnosticFrame<'_> {
    /// Plot title, e.g. `leaves #3: 8 knots, R² = 0.9931`
    #[must_use]
    pub fn title(&self) -> String {
        let mut title = format!(
            "{} #{}: {} knots",
            self.dataset, self.spectrum_index, self.row.knot_count
        );
        if self.row.r_squared.is_finite() {
            title.push_str(&format!(", R² = {:.4}", self.row.r_squared));
        }
        title
    }
}

/// Renders diagnostic frames.
pub trait DiagnosticRenderer {
    /// Renders one frame.
    ///
    /// # Errors
    /// Returns an error if the frame could not be rendered. Sweeps log it and continue.
    fn render(&mut self, frame: &DiagnosticFrame<'_>) -> Result<()>;
}

/// A renderer that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRenderer;
impl DiagnosticRenderer for NoRenderer {
    fn render(&mut self, _: &DiagnosticFrame<'_>) -> Result<()> {
        Ok(())
    }
}
