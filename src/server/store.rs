//! Labeled plaintext reference vectors.
//!
//! The source is a headerless CSV where each row is D numeric features
//! followed by one label. The store is loaded once and never mutated.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{err, Result};

/// Immutable reference set: rows of D features with parallel labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceStore {
    dimension: usize,
    rows: Vec<Vec<f64>>,
    labels: Vec<String>,
}

impl ReferenceStore {
    /// Builds a store from in-memory rows, with the same checks as [`load`].
    ///
    /// [`load`]: ReferenceStore::load
    pub fn from_rows(rows: Vec<Vec<f64>>, labels: Vec<String>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(err!(Configuration, "reference dimension must be positive"));
        }
        if rows.len() != labels.len() {
            return Err(err!(
                DataFormat,
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dimension {
                return Err(err!(
                    DataFormat,
                    "row {} has {} features, expected {}",
                    i + 1,
                    row.len(),
                    dimension
                ));
            }
            if let Some(bad) = row.iter().find(|v| !v.is_finite()) {
                return Err(err!(DataFormat, "row {} has non-finite feature {}", i + 1, bad));
            }
        }
        Ok(Self {
            dimension,
            rows,
            labels,
        })
    }

    /// Parses CSV rows of `dimension` features plus a trailing label.
    pub fn load<R: Read>(reader: R, dimension: usize) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (i, record) in csv.records().enumerate() {
            let record = record?;
            let line = i + 1;
            if record.len() != dimension + 1 {
                return Err(err!(
                    DataFormat,
                    "row {} has {} fields, expected {} features and a label",
                    line,
                    record.len(),
                    dimension
                ));
            }

            let row = record
                .iter()
                .take(dimension)
                .enumerate()
                .map(|(col, field)| {
                    field.parse::<f64>().map_err(|_| {
                        err!(
                            DataFormat,
                            "row {} column {}: {:?} is not a number",
                            line,
                            col + 1,
                            field
                        )
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            rows.push(row);
            labels.push(record[dimension].to_string());
        }

        let store = Self::from_rows(rows, labels, dimension)?;
        tracing::info!(
            rows = store.len(),
            dimension,
            "loaded reference set"
        );
        Ok(store)
    }

    /// Opens and parses a CSV file.
    pub fn load_path(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| err!(DataFormat, "cannot open {}: {}", path.display(), e))?;
        Self::load(file, dimension)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
