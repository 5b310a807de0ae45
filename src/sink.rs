//! Persistence of sweep results.
//!
//! A [`ResultSink`] receives one [`ResultTable`] per spectrum, as soon as that
//! spectrum's sweep finishes.
//!
//! Files are laid out per dataset and per spectrum:
//! ```text
//! <root>/<dataset>/<spectrum index>/data.csv
//! <root>/<dataset>/<spectrum index>/knots-<K>-vs.png   (plotting feature)
//! ```
use std::{
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    error::{Error, Result},
    sweep::{FitRow, ResultTable},
};

/// Column labels of every results file.
pub const HEADER: [&str; 4] = ["Number of knots", "MSE", "RMSE", "R2"];

/// Destination for per-spectrum result tables.
pub trait ResultSink {
    /// Persists one table.
    ///
    /// # Errors
    /// Returns an error if the table could not be stored.
    fn write_table(&mut self, table: &ResultTable) -> Result<()>;
}

/// Directory holding the outputs of one spectrum.
#[must_use]
pub fn spectrum_dir(root: &Path, dataset: &str, spectrum_index: usize) -> PathBuf {
    root.join(dataset).join(spectrum_index.to_string())
}

/// Writes each table to `<root>/<dataset>/<index>/data.csv`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    root: PathBuf,
}
impl CsvSink {
    /// Creates a sink writing below `root`. Nothing is created until the first table.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path the given table is written to.
    #[must_use]
    pub fn table_path(&self, table: &ResultTable) -> PathBuf {
        spectrum_dir(&self.root, table.dataset(), table.spectrum_index()).join("data.csv")
    }

    /// Writes a table as CSV to any writer.
    ///
    /// Undefined metrics of failed rows are written as `NaN`.
    ///
    /// # Errors
    /// Returns an error if a record could not be written.
    pub fn write_csv(table: &ResultTable, writer: impl Write) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        writer.write_record(HEADER)?;
        for row in table.rows() {
            writer.serialize(CsvRecord::from(row))?;
        }

        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
impl ResultSink for CsvSink {
    fn write_table(&mut self, table: &ResultTable) -> Result<()> {
        let path = self.table_path(table);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }

        let file = std::fs::File::create(&path).map_err(|e| Error::io(&path, e))?;
        Self::write_csv(table, file)?;

        log::debug!("Wrote {} rows to {}", table.rows().len(), path.display());
        Ok(())
    }
}

#[derive(Serialize)]
struct CsvRecord {
    knot_count: usize,
    mse: f64,
    rmse: f64,
    r_squared: f64,
}
impl From<&FitRow> for CsvRecord {
    fn from(row: &FitRow) -> Self {
        Self {
            knot_count: row.knot_count,
            mse: row.mse,
            rmse: row.rmse,
            r_squared: row.r_squared,
        }
    }
}

/// Keeps every table in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: Vec<ResultTable>,
}
impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables received so far, in arrival order.
    #[must_use]
    pub fn tables(&self) -> &[ResultTable] {
        &self.tables
    }

    /// Consumes the sink, returning its tables.
    #[must_use]
    pub fn into_tables(self) -> Vec<ResultTable> {
        self.tables
    }
}
impl ResultSink for MemorySink {
    fn write_table(&mut self, table: &ResultTable) -> Result<()> {
        self.tables.push(table.clone());
        Ok(())
    }
}
