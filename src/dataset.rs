//! Spectral datasets and the typed parsing boundary.
//!
//! A dataset is a shared wavelength axis plus a matrix of reflectance cells,
//! one row per spectrum. Every cell is parsed into a [`Cell`] up front so that
//! non-numeric input never reaches the fitting code as a silent NaN.
//!
//! ```text
//!  catalog export (.csv)
//!        │  header: metadata..., 350, 351, ..., 2500
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  axis: Vec<f64>, rows: Vec<Vec<Cell>>
//!   └──────────┘
//!        │
//!        ▼
//!   BandMask::filter_spectrum → FilteredSpectrum
//! ```
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// One parsed value of the dataset matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    /// Empty, non-numeric or non-finite input
    Missing,
    /// A finite measurement
    Numeric(f64),
}
impl Cell {
    /// Parses a raw text cell.
    ///
    /// Anything that is not a finite number becomes [`Cell::Missing`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Numeric(v),
            _ => Self::Missing,
        }
    }

    /// The numeric value, if any.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(v),
            Self::Missing => None,
        }
    }

    /// Whether the cell is missing.
    #[must_use]
    pub fn is_missing(self) -> bool {
        matches!(self, Self::Missing)
    }
}
impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Numeric(value)
        } else {
            Self::Missing
        }
    }
}

/// A collection of spectra sharing one wavelength axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    axis: Vec<f64>,
    rows: Vec<Vec<Cell>>,
}
impl Dataset {
    /// Builds a dataset from an axis and rows aligned with it.
    ///
    /// If the axis is not increasing, its columns are sorted and every row is
    /// permuted the same way.
    ///
    /// # Errors
    /// - [`Error::NoData`] if the axis is empty
    /// - [`Error::LengthMismatch`] if a row is not as long as the axis
    /// - [`Error::DuplicateWavelength`] if a wavelength appears twice
    pub fn new(name: impl Into<String>, axis: Vec<f64>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let name = name.into();
        if axis.is_empty() {
            return Err(Error::NoData(name));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != axis.len()) {
            return Err(Error::LengthMismatch {
                expected: axis.len(),
                found: row.len(),
            });
        }

        let (axis, rows) = if axis.windows(2).all(|w| w[0] < w[1]) {
            (axis, rows)
        } else {
            sort_columns(axis, rows)?
        };

        Ok(Self { name, axis, rows })
    }

    /// Reads a catalog export from CSV.
    ///
    /// Every header label that parses as a number is a wavelength column; all
    /// other columns are metadata and skipped. Each wavelength cell becomes a
    /// [`Cell`].
    ///
    /// # Errors
    /// Returns an error if the CSV cannot be read, or see [`Dataset::new`].
    pub fn from_csv_reader(name: impl Into<String>, reader: impl Read) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let columns: Vec<(usize, f64)> = reader
            .headers()?
            .iter()
            .enumerate()
            .filter_map(|(i, label)| match Cell::parse(label) {
                Cell::Numeric(w) => Some((i, w)),
                Cell::Missing => None,
            })
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = columns
                .iter()
                .map(|&(i, _)| record.get(i).map_or(Cell::Missing, Cell::parse))
                .collect();
            rows.push(row);
        }

        let axis = columns.into_iter().map(|(_, w)| w).collect();
        Self::new(name, axis, rows)
    }

    /// Reads a catalog export from a CSV file, named after the file stem.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        Self::from_csv_reader(name, file)
    }

    /// Dataset name, used to scope output paths.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared wavelength axis, strictly increasing.
    #[must_use]
    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    /// All spectra, each aligned with [`Self::axis`].
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of spectra.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset holds no spectra.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn sort_columns(axis: Vec<f64>, rows: Vec<Vec<Cell>>) -> Result<(Vec<f64>, Vec<Vec<Cell>>)> {
    let mut order: Vec<usize> = (0..axis.len()).collect();
    order.sort_by(|&a, &b| axis[a].total_cmp(&axis[b]));

    if let Some(w) = order.windows(2).find(|w| axis[w[0]] == axis[w[1]]) {
        return Err(Error::DuplicateWavelength(axis[w[0]]));
    }

    let sorted_axis = order.iter().map(|&i| axis[i]).collect();
    let sorted_rows = rows
        .into_iter()
        .map(|row| order.iter().map(|&i| row[i]).collect())
        .collect();
    Ok((sorted_axis, sorted_rows))
}
