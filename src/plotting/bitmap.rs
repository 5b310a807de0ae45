//! PNG renderer using the `plotters` crate
//!
//! Uses the bitmap backend; one file per frame.
use std::{
    ops::Range,
    path::{Path, PathBuf},
};

use plotters::prelude::*;

use crate::{
    error::{Error, Result},
    plotting::{DiagnosticFrame, DiagnosticRenderer},
    sink::spectrum_dir,
    value::CoordExt,
};

/// Draws each frame into `<root>/<dataset>/<index>/knots-<K>-vs.png`.
///
/// The original spectrum is a solid green line, the fitted spline a dashed red one.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    root: PathBuf,
    size: (u32, u32),
}
impl PlottersRenderer {
    /// Creates a renderer writing below `root` with 1024x768 images.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            size: (1024, 768),
        }
    }

    /// Sets the image size in pixels.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Path the given frame is drawn to.
    #[must_use]
    pub fn frame_path(&self, frame: &DiagnosticFrame<'_>) -> PathBuf {
        spectrum_dir(&self.root, frame.dataset, frame.spectrum_index)
            .join(format!("knots-{}-vs.png", frame.row.knot_count))
    }
}
impl DiagnosticRenderer for PlottersRenderer {
    fn render(&mut self, frame: &DiagnosticFrame<'_>) -> Result<()> {
        let path = self.frame_path(frame);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }

        draw(&path, self.size, frame).map_err(|e| Error::Render(e.to_string()))?;
        log::trace!("Rendered {}", path.display());
        Ok(())
    }
}

fn draw<'a>(
    path: &'a Path,
    size: (u32, u32),
    frame: &DiagnosticFrame<'_>,
) -> std::result::Result<(), DrawError<'a>> {
    let observed = frame.spectrum.points();
    let fitted = frame.fit.points();

    let x_range = observed.x_range().ok_or(DrawError::Empty)?;
    let y_range = padded(union(observed.y_range(), fitted.y_range()).ok_or(DrawError::Empty)?);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(5)
        .caption(frame.title(), (FontFamily::SansSerif, 16).into_font())
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .label_style((FontFamily::SansSerif, 12))
        .x_desc("Wavelength (nm)")
        .y_desc("Reflectance")
        .draw()?;

    let original = ShapeStyle::from(&GREEN).stroke_width(2);
    chart
        .draw_series(LineSeries::new(observed, original))?
        .label("Original")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], original));

    let spline = ShapeStyle::from(&RED).stroke_width(2);
    chart
        .draw_series(DashedLineSeries::new(fitted, 10, 5, spline))?
        .label("B-spline")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], spline));

    //
    // Legend
    chart
        .configure_series_labels()
        .label_font((FontFamily::SansSerif, 10))
        .background_style(WHITE.mix(0.5))
        .border_style(BLACK)
        .position(SeriesLabelPosition::LowerRight)
        .draw()?;

    root.present()?;
    Ok(())
}

fn union(a: Option<Range<f64>>, b: Option<Range<f64>>) -> Option<Range<f64>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.start.min(b.start)..a.end.max(b.end)),
        (a, b) => a.or(b),
    }
}

/// 5% headroom on both sides; flat curves get a fixed band.
fn padded(range: Range<f64>) -> Range<f64> {
    let pad = ((range.end - range.start) * 0.05).max(1e-3);
    range.start - pad..range.end + pad
}

/// Error occurring during plotting
#[derive(Debug, thiserror::Error)]
enum DrawError<'a> {
    /// Error drawing the plot
    #[error("Error drawing plot: {0}")]
    Draw(#[from] DrawingAreaErrorKind<<BitMapBackend<'a> as DrawingBackend>::ErrorType>),

    /// Nothing finite to draw
    #[error("No finite values to plot")]
    Empty,
}
